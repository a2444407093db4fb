mod commands;
mod config;
mod error;
mod logger;
mod progress;
mod runner;
mod schema;
mod stack;
mod template;
use crate::commands::Commands;
use crate::logger::Logger;
use crate::runner::{Runnable, Runner};
use clap::Parser;

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    name = "edgechain",
    version,
    about = "Deploy a demo AppSync GraphQL API behind two chained CloudFront distributions",
    long_about = "Synthesizes a CloudFormation template for a lambda-authorized AppSync GraphQL API fronted by two chained CloudFront distributions, and drives the stack through deploys, status checks, and teardown."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
async fn run(command: impl Runnable) {
    if let Err(error) = command.runner().run().await {
        eprintln!("\n{}\n{error}", console::style("Error").red().bold());
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    Logger::init();

    // Match all commands here, in one place
    match Cli::parse().command {
        Commands::Deploy(cmd) => run(cmd).await,
        Commands::Template(cmd) => run(cmd).await,
        Commands::Status(cmd) => run(cmd).await,
        Commands::Outputs(cmd) => run(cmd).await,
        Commands::Destroy(cmd) => run(cmd).await,
    }
}
