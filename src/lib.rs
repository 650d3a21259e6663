// scaffold - on-demand command packages for a scaffolding CLI
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::invocation::{DispatchInvocation, ExitOutcome};
pub use models::package::{PackageOptions, ResolvedDescriptor, UnresolvedDescriptor, VersionSpec};
pub use services::command_dispatcher::CommandDispatcher;
pub use services::package_installer::{InstallMechanism, InstallRequest, Package, UpdateOutcome};
pub use services::registry_client::RegistryClient;
pub use utils::config::Config;
pub use utils::error::{Result, ScaffoldError};
