use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, error};

use crate::models::invocation::{DispatchInvocation, ExitOutcome};
use crate::models::package::{PackageOptions, LATEST};
use crate::services::package_installer::{InstallMechanism, Package};
use crate::services::registry_client::RegistryClient;
use crate::services::tarball_installer::TarballInstaller;
use crate::utils::config::Config;
use crate::utils::error::{Result, ScaffoldError};

/// Command name → package that implements it
pub const COMMAND_PACKAGES: &[(&str, &str)] = &[
    ("init", "@scaffold-cli/init"),
    ("publish", "@scaffold-cli/publish"),
];

pub fn package_for_command(command: &str) -> Option<&'static str> {
    COMMAND_PACKAGES
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, package)| *package)
}

/// Runs a command by executing its package's entry point in a child process
#[derive(Debug)]
pub struct CommandDispatcher<'a, M = TarballInstaller> {
    config: &'a Config,
    registry: RegistryClient,
    mechanism: M,
}

impl<'a> CommandDispatcher<'a, TarballInstaller> {
    pub fn new(config: &'a Config) -> Result<Self> {
        let registry = RegistryClient::from_config(config)?;
        Ok(Self::with_parts(config, registry, TarballInstaller::from_config(config)))
    }
}

impl<'a, M: InstallMechanism + Clone> CommandDispatcher<'a, M> {
    pub const fn with_parts(config: &'a Config, registry: RegistryClient, mechanism: M) -> Self {
        Self {
            config,
            registry,
            mechanism,
        }
    }

    /// Resolve, install or update, locate and run. `Skipped` when the
    /// package declares no entry file.
    pub async fn dispatch(&self, invocation: &DispatchInvocation) -> Result<ExitOutcome> {
        let package_name = package_for_command(&invocation.command).ok_or_else(|| {
            ScaffoldError::ConfigError(format!("no package is registered for command '{}'", invocation.command))
        })?;

        let package = self.prepare_package(package_name).await?;

        let Some(root_file) = package.root_file_path() else {
            debug!(package = package_name, "no entry file declared, nothing to run");
            return Ok(ExitOutcome::Skipped);
        };
        debug!(root_file = %root_file.display(), "entry file");

        let code = self.launch(&root_file, invocation).await?;
        Ok(ExitOutcome::Exited(code))
    }

    /// Cached package (installed or brought up to date), or the local override as-is
    pub async fn prepare_package(&self, package_name: &str) -> Result<Package<M>> {
        if let Some(target_path) = &self.config.target_path {
            debug!(target_path = %target_path.display(), "using local package");
            return Package::new(
                PackageOptions {
                    target_path: target_path.clone(),
                    store_dir: None,
                    package_name: package_name.to_string(),
                    package_version: LATEST.to_string(),
                },
                self.registry.clone(),
                self.mechanism.clone(),
            );
        }

        let target_path = self.config.dependencies_dir();
        let store_dir = self.config.store_dir();
        debug!(target_path = %target_path.display(), store_dir = %store_dir.display(), "using package cache");

        let mut package = Package::new(
            PackageOptions {
                target_path,
                store_dir: Some(store_dir),
                package_name: package_name.to_string(),
                package_version: LATEST.to_string(),
            },
            self.registry.clone(),
            self.mechanism.clone(),
        )?;

        if package.exists().await? {
            package.update().await?;
        } else {
            package.install().await?;
        }
        Ok(package)
    }

    /// `node -e "require('<root>').call(null, <args>)"` with inherited stdio
    pub async fn launch(&self, root_file: &Path, invocation: &DispatchInvocation) -> Result<i32> {
        let script = invocation.entry_script(root_file).map_err(|e| {
            ScaffoldError::ConfigError(format!("cannot serialize arguments for '{}': {e}", invocation.command))
        })?;
        debug!(%script, "launching command package");

        let status = Command::new(&self.config.node_bin)
            .arg("-e")
            .arg(&script)
            .current_dir(std::env::current_dir()?)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                error!(node = %self.config.node_bin.display(), error = %e, "failed to launch command package");
                ScaffoldError::DispatchError(e)
            })?;

        let code = exit_code(status);
        debug!(code, "command package finished");
        Ok(code)
    }
}

/// Exit code to propagate; signals map to `128 + signal` like a shell
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
