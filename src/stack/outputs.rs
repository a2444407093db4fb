use crate::stack::Stack;
use eyre::{ContextCompat, WrapErr};

/// A named value exported by the deployed stack
#[derive(Clone, Debug)]
pub(crate) struct Output {
    pub(crate) key: String,
    pub(crate) value: String,
}

impl Stack {
    /// Output values of the deployed stack, the two distribution hostnames
    pub(crate) async fn outputs(&self) -> eyre::Result<Vec<Output>> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(self.name.clone())
            .send()
            .await
            .wrap_err("Failed to describe stack")?;

        let stack = response.stacks().first().wrap_err("Stack not found")?;

        Ok(stack
            .outputs()
            .iter()
            .filter_map(|output| {
                Some(Output {
                    key: output.output_key()?.to_string(),
                    value: output.output_value()?.to_string(),
                })
            })
            .collect())
    }
}
