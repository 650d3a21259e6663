use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{Result, ScaffoldError};

/// Version sentinel meaning "whatever the registry's latest dist-tag is"
pub const LATEST: &str = "latest";

/// Requested version of a command package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSpec {
    /// Resolved against the registry on first use
    Latest,
    /// A literal version, used as-is
    Exact(String),
}

impl VersionSpec {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == LATEST {
            Self::Latest
        } else {
            Self::Exact(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Latest => LATEST,
            Self::Exact(version) => version,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw construction input for a package descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOptions {
    /// Install root, or the operator's local override
    #[serde(default)]
    pub target_path: PathBuf,
    /// Shared cache directory; empty means "no shared cache"
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub package_version: String,
}

/// Replace path separators so a scoped name stays one path segment
pub fn sanitize_package_name(package_name: &str) -> String {
    package_name.replace(['/', '\\'], "_")
}

/// `{store_dir}/_{sanitized}@{version}@{package_name}`
///
/// Pure function of its inputs; the layout is shared with npminstall so
/// entries can be reused across tools.
pub fn cache_entry_path(store_dir: &Path, package_name: &str, version: &str) -> PathBuf {
    store_dir.join(format!(
        "_{}@{}@{}",
        sanitize_package_name(package_name),
        version,
        package_name
    ))
}

/// A descriptor whose version may still be the `latest` sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDescriptor {
    target_path: PathBuf,
    store_dir: Option<PathBuf>,
    package_name: String,
    version: VersionSpec,
    cache_prefix: String,
}

impl UnresolvedDescriptor {
    pub fn new(options: PackageOptions) -> Result<Self> {
        let package_name = options.package_name.trim().to_string();
        if package_name.is_empty() {
            return Err(ScaffoldError::ConfigError(
                "package options must name a package (packageName is empty)".to_string(),
            ));
        }

        if options.package_version.trim().is_empty() {
            return Err(ScaffoldError::ConfigError(format!(
                "package options for {package_name} must name a version or \"{LATEST}\" (packageVersion is empty)"
            )));
        }

        let store_dir = options.store_dir.filter(|dir| !dir.as_os_str().is_empty());

        Ok(Self {
            target_path: options.target_path,
            store_dir,
            cache_prefix: sanitize_package_name(&package_name),
            version: VersionSpec::parse(&options.package_version),
            package_name,
        })
    }

    /// Build from loosely-typed options, e.g. a deserialized invocation record
    pub fn from_value(value: Option<&serde_json::Value>) -> Result<Self> {
        let value = value.ok_or_else(|| {
            ScaffoldError::ConfigError("package options are required".to_string())
        })?;

        if !value.is_object() {
            return Err(ScaffoldError::ConfigError(format!(
                "package options must be an object, got {}",
                json_kind(value)
            )));
        }

        let options: PackageOptions = serde_json::from_value(value.clone())
            .map_err(|e| ScaffoldError::ConfigError(format!("invalid package options: {e}")))?;
        Self::new(options)
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn version(&self) -> &VersionSpec {
        &self.version
    }

    /// Finish resolution with a concrete version
    pub fn into_resolved(self, version: String) -> ResolvedDescriptor {
        ResolvedDescriptor {
            target_path: self.target_path,
            store_dir: self.store_dir,
            package_name: self.package_name,
            version,
            cache_prefix: self.cache_prefix,
        }
    }
}

/// A descriptor that always carries a concrete version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescriptor {
    target_path: PathBuf,
    store_dir: Option<PathBuf>,
    package_name: String,
    version: String,
    cache_prefix: String,
}

impl ResolvedDescriptor {
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Cache entry of the current version; `None` without a store directory
    pub fn cache_entry_path(&self) -> Option<PathBuf> {
        self.cache_entry_path_for(&self.version)
    }

    /// Cache entry of an arbitrary candidate version
    pub fn cache_entry_path_for(&self, version: &str) -> Option<PathBuf> {
        self.store_dir.as_ref().map(|store| {
            store.join(format!("_{}@{}@{}", self.cache_prefix, version, self.package_name))
        })
    }

    /// Make `version` the current one (after install or when already cached)
    pub fn adopt_version(&mut self, version: String) {
        self.version = version;
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
