use std::path::Path;

use serde_json::{Map, Value};

/// Key of the back-reference to the parent command record
pub const PARENT_KEY: &str = "parent";

/// Prefix marking bookkeeping entries that stay in this process
pub const INTERNAL_KEY_PREFIX: char = '_';

/// One command invocation, as handed to a command package
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchInvocation {
    /// Logical command name (`init`, `publish`)
    pub command: String,
    /// Positional arguments in declaration order
    pub args: Vec<Value>,
    /// Flags and bookkeeping entries of the parsed command
    pub options: Map<String, Value>,
}

impl DispatchInvocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            options: Map::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, arg: Value) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Options that may cross the process boundary
    pub fn transportable_options(&self) -> Map<String, Value> {
        self.options
            .iter()
            .filter(|(key, _)| !is_internal_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// `[...args, options]`, the argument list the entry point is called with
    pub fn argument_list(&self) -> Vec<Value> {
        let mut list = self.args.clone();
        list.push(Value::Object(self.transportable_options()));
        list
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.argument_list())
    }

    /// `require('<root file>').call(null, <args>)`
    pub fn entry_script(&self, root_file: &Path) -> serde_json::Result<String> {
        Ok(format!(
            "require('{}').call(null, {})",
            escape_single_quoted(&root_file.to_string_lossy()),
            self.to_json()?
        ))
    }
}

/// How a dispatched command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// No entry file was found, so no child process ran
    Skipped,
    /// The child exited with this code
    Exited(i32),
}

impl ExitOutcome {
    /// Code the parent process should exit with
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Skipped => 0,
            Self::Exited(code) => code,
        }
    }
}

fn is_internal_key(key: &str) -> bool {
    key.starts_with(INTERNAL_KEY_PREFIX) || key == PARENT_KEY
}

fn escape_single_quoted(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
