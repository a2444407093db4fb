use crate::error::Error;
use crate::runner::{Runnable, Runner};
use crate::stack::Stack;
use eyre::WrapErr;
use std::io::{self, Write};

#[derive(clap::Args, Clone)]
pub(crate) struct DestroyCommand {
    /// Name of the stack to destroy (optional, defaults to the configured name)
    #[arg(short, long)]
    name: Option<String>,
}

impl Runnable for DestroyCommand {
    fn runner(&self) -> impl Runner {
        DestroyRunner {
            command: self.clone(),
        }
    }
}

struct DestroyRunner {
    command: DestroyCommand,
}

impl Runner for DestroyRunner {
    /// Delete the stack after an explicit confirmation
    async fn run(&mut self) -> Result<(), Error> {
        let name = match &self.command.name {
            Some(name) => name.clone(),
            None => self.config()?.name,
        };

        println!(
            "{} {}",
            console::style("About to destroy").bold(),
            console::style(&name).bold().red(),
        );
        print!(
            "{} {}: ",
            console::style("Do you want to proceed?").bold(),
            console::style("[y/N]").dim()
        );
        io::stdout().flush().wrap_err("Failed to flush stdout")?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .wrap_err("Failed to read input")?;

        let confirmed = matches!(input.trim().to_lowercase().as_ref(), "y" | "yes");

        if !confirmed {
            println!("{}", console::style("Destroying canceled").dim().bold());
            return Ok(());
        }

        println!(
            "{}: {}",
            console::style("Destroying").bold(),
            console::style(&name)
        );

        let stack = Stack::new(&name).await;

        if !stack
            .is_exists()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?
        {
            return Err(self.error(
                Some("Stack not found"),
                Some("Nothing to destroy under this name"),
                None,
            ));
        }

        stack
            .destroy()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?;

        println!(
            "{}",
            console::style("Deletion started, run `edgechain status` to track it").green()
        );

        Ok(())
    }
}
