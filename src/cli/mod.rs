// CLI module for command-line interface

pub mod command;
pub mod init;
pub mod publish;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::models::invocation::{DispatchInvocation, ExitOutcome, PARENT_KEY};
use crate::services::command_dispatcher::CommandDispatcher;
use crate::services::registry_client::RegistryClient;
use crate::services::update_notifier::check_for_update;
use crate::utils::config::{Config, ConfigOverrides};
use crate::utils::error::Result;
use crate::utils::logging::init_tracing;

use self::command::drive;
use self::init::InitCommand;
use self::publish::PublishCommand;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "scaffold")]
#[command(about = "Project scaffolding with commands delivered as npm packages")]
#[command(long_about = r#"scaffold runs each of its commands from a package fetched on demand.

The first time a command runs, its package is downloaded from the registry
into ~/.scaffold-cli/dependencies. Later runs reuse the cached copy and pick
up newer releases automatically.

Examples:
  scaffold init my-app                  Create a project named my-app
  scaffold init --force                 Initialize even if the directory is not empty
  scaffold publish                      Publish the project in the current directory
  scaffold -t ../init init              Run a local checkout of the init package"#)]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command; forwarded to the child as `parent`
#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalArgs {
    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Run the command package from this local directory instead of the cache
    #[arg(short = 't', long, env = "CLI_TARGET_PATH", global = true)]
    pub target_path: Option<PathBuf>,

    /// Directory (relative to the home directory) holding the package cache
    #[arg(long, env = "CLI_HOME", global = true)]
    #[serde(skip)]
    pub cli_home: Option<String>,

    /// npm registry to resolve command packages from
    #[arg(long, env = "SCAFFOLD_REGISTRY", global = true)]
    #[serde(skip)]
    pub registry: Option<String>,

    /// Node.js executable used to run command packages
    #[arg(long, env = "SCAFFOLD_NODE", global = true)]
    #[serde(skip)]
    pub node: Option<PathBuf>,

    /// Skip the check for a newer scaffold release
    #[arg(long, global = true)]
    #[serde(skip)]
    pub no_update_check: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            debug: self.debug,
            target_path: self.target_path.clone(),
            cli_home: self.cli_home.clone(),
            registry: self.registry.clone(),
            node_bin: self.node.clone(),
            no_update_check: self.no_update_check,
        }
    }
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new project from a template
    #[command(long_about = r#"Initialize a new project or component from a template.

The template choice and prompts are handled by the @scaffold-cli/init package,
which is installed or updated before it runs.

Examples:
  scaffold init                         Initialize in the current directory
  scaffold init my-app                  Initialize a project named my-app
  scaffold init my-app --force          Overwrite a non-empty directory"#)]
    Init {
        /// Name of the project to create
        project_name: Option<String>,

        /// Initialize even if the target directory is not empty
        #[arg(short, long)]
        force: bool,
    },

    /// Publish the project in the current directory
    Publish,
}

impl Commands {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Publish => "publish",
        }
    }

    /// The raw parse result handed to a command's `initialize`
    pub fn raw_invocation(&self, global: &GlobalArgs) -> DispatchInvocation {
        let mut invocation = DispatchInvocation::new(self.name());
        let mut positional = Vec::new();

        match self {
            Self::Init { project_name, force } => {
                let name = project_name.as_ref().map_or(Value::Null, |n| json!(n));
                positional.push(name.clone());
                invocation = invocation.with_arg(name).with_option("force", json!(force));
            }
            Self::Publish => {}
        }

        let parent = serde_json::to_value(global)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_else(Map::new);

        invocation
            .with_option("_name", json!(self.name()))
            .with_option("_args", Value::Array(positional))
            .with_option(PARENT_KEY, Value::Object(parent))
    }
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Load configuration, run startup checks, then drive the command
    pub async fn execute(cli: Cli) -> Result<ExitOutcome> {
        let config = Config::load(cli.global.overrides())?;
        init_tracing(&config);

        prepare(&config).await?;

        let dispatcher = CommandDispatcher::new(&config)?;
        let raw = cli.command.raw_invocation(&cli.global);

        match cli.command {
            Commands::Init { .. } => drive(&mut InitCommand::default(), raw, &dispatcher).await,
            Commands::Publish => drive(&mut PublishCommand::default(), raw, &dispatcher).await,
        }
    }
}

/// Startup work done before any command
async fn prepare(config: &Config) -> Result<()> {
    info!("scaffold {}", env!("CARGO_PKG_VERSION"));
    debug!(home = %config.home.display(), cli_home = %config.cli_home.display(), "configuration loaded");

    if config.update_check {
        check_for_update(&RegistryClient::from_config(config)?).await;
    }
    Ok(())
}
