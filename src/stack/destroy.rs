use crate::stack::Stack;
use aws_sdk_cloudformation::types::DeletionMode;
use eyre::WrapErr;

impl Stack {
    /// Delete the stack with everything it provisioned
    ///
    /// Requires the "cloudformation:DeleteStack" permission.
    pub(crate) async fn destroy(&self) -> eyre::Result<()> {
        self.client
            .delete_stack()
            .deletion_mode(DeletionMode::ForceDeleteStack)
            .stack_name(self.name.clone())
            .send()
            .await
            .wrap_err("Failed to destroy stack")?;

        Ok(())
    }
}
