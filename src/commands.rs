pub mod deploy;
pub mod destroy;
pub mod outputs;
pub mod status;
pub mod template;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the stack and wait for CloudFormation to settle
    Deploy(deploy::DeployCommand),

    /// Print the synthesized CloudFormation template
    Template(template::TemplateCommand),

    /// Show the status of the most recent stack run
    Status(status::StatusCommand),

    /// Print the outputs of the deployed stack
    Outputs(outputs::OutputsCommand),

    /// [DANGER] Destroy the stack with everything it provisioned
    Destroy(destroy::DestroyCommand),
}
