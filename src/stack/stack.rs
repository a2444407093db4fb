use crate::template::Template;
use aws_config::BehaviorVersion;
use eyre::WrapErr;

/// The CloudFormation stack holding every resource of the demo
#[derive(Clone, Debug)]
pub(crate) struct Stack {
    pub(crate) name: String,
    pub(super) client: aws_sdk_cloudformation::Client,
}

impl Stack {
    pub(crate) async fn new(name: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::v2025_01_17())
            .load()
            .await;

        Stack {
            name: name.to_string(),
            client: aws_sdk_cloudformation::Client::new(&config),
        }
    }

    /// Check if the stack already exists
    pub(crate) async fn is_exists(&self) -> eyre::Result<bool> {
        let result = self
            .client
            .describe_stacks()
            .set_stack_name(Some(self.name.clone()))
            .send()
            .await;

        if let Err(e) = &result {
            if let aws_sdk_cloudformation::error::SdkError::ServiceError(err) = e {
                if err.err().meta().code().unwrap_or_default().eq("ValidationError") {
                    return Ok(false);
                } else {
                    return Err(eyre::eyre!(
                        "Service error while describing stack: {:?}",
                        err
                    ));
                }
            } else {
                return Err(eyre::eyre!("Failed to describe stack: {:?}", e));
            }
        }

        Ok(true)
    }

    /// Provision the template in CloudFormation
    ///
    /// Returns false when the stack exists and CloudFormation reports there
    /// is nothing to change in it.
    pub(crate) async fn provision(&self, template: &Template) -> eyre::Result<bool> {
        let capabilities = aws_sdk_cloudformation::types::Capability::CapabilityIam;
        let template_string = template.body()?;

        if self.is_exists().await? {
            let result = self
                .client
                .update_stack()
                .capabilities(capabilities)
                .stack_name(self.name.clone())
                .template_body(template_string)
                .send()
                .await;

            // An update with an identical template is not an error for us
            if let Err(aws_sdk_cloudformation::error::SdkError::ServiceError(err)) = &result {
                if err
                    .err()
                    .meta()
                    .message()
                    .unwrap_or_default()
                    .contains("No updates are to be performed")
                {
                    return Ok(false);
                }
            }

            result.wrap_err("Failed to update stack")?;
        } else {
            self.client
                .create_stack()
                .capabilities(capabilities)
                .stack_name(self.name.clone())
                .template_body(template_string)
                .send()
                .await
                .wrap_err("Failed to create stack")?;
        }

        Ok(true)
    }
}
