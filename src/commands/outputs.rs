use crate::error::Error;
use crate::runner::{Runnable, Runner};
use crate::stack::Stack;

#[derive(clap::Args, Clone)]
pub(crate) struct OutputsCommand {}

impl Runnable for OutputsCommand {
    fn runner(&self) -> impl Runner {
        OutputsRunner
    }
}

struct OutputsRunner;

impl Runner for OutputsRunner {
    /// Print the distribution hostnames of the deployed stack
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

        let outputs = stack
            .outputs()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?;

        if outputs.is_empty() {
            println!("{}", console::style("No outputs found").yellow());
            return Ok(());
        }

        for output in outputs {
            println!(
                "{} {}",
                console::style(format!("{}:", output.key)).bold(),
                output.value,
            );
        }

        Ok(())
    }
}
