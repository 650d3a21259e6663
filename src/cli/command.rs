// Lifecycle shared by every dispatched command

use std::future::Future;

use crate::models::invocation::{DispatchInvocation, ExitOutcome};
use crate::services::command_dispatcher::CommandDispatcher;
use crate::services::package_installer::InstallMechanism;
use crate::utils::error::Result;

/// A command backed by a remote package.
///
/// `initialize` reads the raw parse result; `run` does the work. Both are
/// called by [`drive`], always in that order and exactly once.
pub trait Command {
    fn initialize(&mut self, raw: DispatchInvocation) -> Result<()>;

    fn run<M: InstallMechanism + Clone>(
        &self,
        dispatcher: &CommandDispatcher<'_, M>,
    ) -> impl Future<Output = Result<ExitOutcome>>;
}

/// The fixed driver: initialize, then run
pub async fn drive<C: Command, M: InstallMechanism + Clone>(
    command: &mut C,
    raw: DispatchInvocation,
    dispatcher: &CommandDispatcher<'_, M>,
) -> Result<ExitOutcome> {
    command.initialize(raw)?;
    command.run(dispatcher).await
}
