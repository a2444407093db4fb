use crate::error::Error;
use crate::runner::{Runnable, Runner};
use crate::schema::Schema;
use crate::template::Template;

#[derive(clap::Args, Clone)]
pub(crate) struct TemplateCommand {}

impl Runnable for TemplateCommand {
    fn runner(&self) -> impl Runner {
        TemplateRunner
    }
}

struct TemplateRunner;

impl Runner for TemplateRunner {
    /// Synthesize and print the template without touching AWS
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.config()?;
        let schema = Schema::from_path(&config.schema).inspect_err(|e| log::error!("{e:?}"))?;

        let template = Template::new(&config, &schema);

        // Plain JSON on stdout so the output can be piped further
        println!("{}", template.body()?);

        Ok(())
    }
}
