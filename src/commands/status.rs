use crate::error::Error;
use crate::runner::{Runnable, Runner};
use crate::stack::{Stack, State};

#[derive(clap::Args, Clone)]
pub(crate) struct StatusCommand {}

impl Runnable for StatusCommand {
    fn runner(&self) -> impl Runner {
        StatusRunner
    }
}

struct StatusRunner;

impl Runner for StatusRunner {
    /// Show how the most recent stack run went
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.config()?;
        let stack = Stack::new(&config.name).await;

        if !stack
            .is_exists()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?
        {
            return Err(self.error(
                Some("Stack not found"),
                Some("Deploy it first with `edgechain deploy`"),
                None,
            ));
        }

        let status = stack
            .status()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?;

        match status.state {
            State::InProgress => println!(
                "{} {}",
                console::style(&config.name).bold(),
                console::style("in progress").yellow().bold(),
            ),

            State::Complete => println!(
                "{} {}",
                console::style(&config.name).bold(),
                console::style("complete").green().bold(),
            ),

            State::Failed => {
                println!(
                    "{} {}",
                    console::style(&config.name).bold(),
                    console::style("failed").red().bold(),
                );

                for error in &status.errors {
                    println!("{}", console::style(error).dim());
                }
            }
        }

        Ok(())
    }
}
