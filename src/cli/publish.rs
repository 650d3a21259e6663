use tracing::debug;

use crate::cli::command::Command;
use crate::models::invocation::{DispatchInvocation, ExitOutcome};
use crate::services::command_dispatcher::CommandDispatcher;
use crate::services::package_installer::InstallMechanism;
use crate::utils::error::{Result, ScaffoldError};

/// `scaffold publish`
#[derive(Debug, Default)]
pub struct PublishCommand {
    invocation: Option<DispatchInvocation>,
}

impl Command for PublishCommand {
    fn initialize(&mut self, raw: DispatchInvocation) -> Result<()> {
        debug!(args = ?raw.args, "publish");
        self.invocation = Some(raw);
        Ok(())
    }

    async fn run<M: InstallMechanism + Clone>(&self, dispatcher: &CommandDispatcher<'_, M>) -> Result<ExitOutcome> {
        let invocation = self
            .invocation
            .as_ref()
            .ok_or_else(|| ScaffoldError::ConfigError("publish was run before it was initialized".to_string()))?;
        dispatcher.dispatch(invocation).await
    }
}
