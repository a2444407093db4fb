use crate::error::Error;
use crate::progress::{Progress, ProgressStatus};
use crate::runner::{Runnable, Runner};
use crate::schema::Schema;
use crate::stack::{Stack, State};
use crate::template::Template;
use clap::ArgAction;
use std::time::Instant;

#[derive(clap::Args, Clone)]
pub(crate) struct DeployCommand {
    /// Start provisioning and return without waiting for the outcome
    #[arg(long, action = ArgAction::SetTrue)]
    no_wait: bool,
}

impl Runnable for DeployCommand {
    fn runner(&self) -> impl Runner {
        DeployRunner {
            command: self.clone(),
        }
    }
}

struct DeployRunner {
    command: DeployCommand,
}

impl Runner for DeployRunner {
    /// Synthesize the template and drive CloudFormation to the outcome
    async fn run(&mut self) -> Result<(), Error> {
        let start_time = Instant::now();
        let config = self.config()?;

        println!(
            "{} {}...",
            console::style("Deploying").green().bold(),
            console::style(&config.name).bold(),
        );

        let schema = Schema::from_path(&config.schema).inspect_err(|e| log::error!("{e:?}"))?;

        let template = Template::new(&config, &schema);
        log::debug!("Synthesized template: {template}");

        let stack = Stack::new(&config.name).await;
        let progress = Progress::new(&config.name);

        // Wait out a previous run still in flight before submitting a new one
        if stack
            .is_exists()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?
        {
            let mut status = stack.status().await?;

            if status.state == State::InProgress {
                progress.wait("Waiting for the previous deployment to finish...");
            }

            while status.state == State::InProgress {
                tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                status = stack.status().await?;
            }
        }

        progress.log_stage("Provisioning");

        let updated = stack
            .provision(&template)
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?;

        if !updated {
            progress.finish(
                "Provisioning",
                ProgressStatus::Warn,
                Some("Nothing to update"),
            );

            return Ok(());
        }

        if self.command.no_wait {
            progress.finish(
                "Provisioning",
                ProgressStatus::Success,
                Some("Started, run `edgechain status` to track it"),
            );

            return Ok(());
        }

        progress.wait("Provisioning resources...");

        // DescribeStackEvents may briefly lag behind the provision call
        tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;

        // Poll the status of the deployment
        let mut status = stack.status().await?;

        while status.state == State::InProgress {
            tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
            status = stack.status().await?;
        }

        if status.state == State::Failed {
            progress.error("Provisioning");

            return Err(self.error(
                Some("Deployment failed"),
                Some(&status.errors.join("\n")),
                None,
            ));
        }

        progress.finish("Provisioning", ProgressStatus::Success, None);

        let outputs = stack
            .outputs()
            .await
            .inspect_err(|e| log::error!("Error: {e:?}"))?;

        for output in &outputs {
            println!(
                "{} {}",
                console::style(format!("{}:", output.key)).bold(),
                output.value,
            );
        }

        if let Some(outer) = outputs
            .iter()
            .find(|o| o.key == "OuterDistributionDomainName")
        {
            println!(
                "{} https://{}/graphql",
                console::style("GraphQL endpoint:").bold(),
                outer.value,
            );
        }

        println!(
            "    {} Deployed in {:.2}s",
            console::style("Finished").green().bold(),
            start_time.elapsed().as_secs_f64(),
        );

        Ok(())
    }
}
