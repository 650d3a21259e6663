use serde_json::Value;
use tracing::debug;

use crate::cli::command::Command;
use crate::models::invocation::{DispatchInvocation, ExitOutcome};
use crate::services::command_dispatcher::CommandDispatcher;
use crate::services::package_installer::InstallMechanism;
use crate::utils::error::{Result, ScaffoldError};

/// `scaffold init [projectName] [--force]`
#[derive(Debug, Default)]
pub struct InitCommand {
    pub project_name: String,
    pub force: bool,
    invocation: Option<DispatchInvocation>,
}

impl Command for InitCommand {
    fn initialize(&mut self, raw: DispatchInvocation) -> Result<()> {
        self.project_name = raw
            .args
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.force = raw.options.get("force").and_then(Value::as_bool).unwrap_or(false);

        debug!(project_name = %self.project_name, force = self.force, "init");
        self.invocation = Some(raw);
        Ok(())
    }

    async fn run<M: InstallMechanism + Clone>(&self, dispatcher: &CommandDispatcher<'_, M>) -> Result<ExitOutcome> {
        let invocation = self
            .invocation
            .as_ref()
            .ok_or_else(|| ScaffoldError::ConfigError("init was run before it was initialized".to_string()))?;
        dispatcher.dispatch(invocation).await
    }
}
