use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::package::{
    cache_entry_path, PackageOptions, ResolvedDescriptor, UnresolvedDescriptor, VersionSpec,
};
use crate::services::registry_client::RegistryClient;
use crate::services::root_file_locator;
use crate::services::tarball_installer::TarballInstaller;
use crate::utils::error::{Result, ScaffoldError};
use crate::utils::fs_utils::{ensure_directory_exists, path_exists};

/// One package to materialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
}

/// Arguments handed to the install mechanism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRequest {
    /// Install root; `node_modules/<name>` links are created below it
    pub root: PathBuf,
    /// Where cache entries live
    pub store_dir: PathBuf,
    /// Registry URL to download from
    pub registry: String,
    pub pkgs: Vec<PackageSpec>,
}

/// Whatever actually puts package files on disk.
///
/// On success every requested package must be present at its cache entry
/// path. Failures are returned as-is; no retries happen above this layer.
pub trait InstallMechanism {
    fn install(&self, request: &InstallRequest) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Which branch of `update` ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Candidate entry was missing and has been installed
    Installed { from: String, to: String },
    /// Candidate entry already existed; adopted without reinstalling
    AlreadyCached { version: String },
}

impl UpdateOutcome {
    pub fn version(&self) -> &str {
        match self {
            Self::Installed { to, .. } => to,
            Self::AlreadyCached { version } => version,
        }
    }
}

/// A command package backed by the shared cache or a local override
#[derive(Debug)]
pub struct Package<M = TarballInstaller> {
    descriptor: UnresolvedDescriptor,
    /// Filled on first use; never re-resolved afterwards
    resolved: Option<ResolvedDescriptor>,
    registry: RegistryClient,
    mechanism: M,
}

impl<M: InstallMechanism> Package<M> {
    pub fn new(options: PackageOptions, registry: RegistryClient, mechanism: M) -> Result<Self> {
        Ok(Self::from_descriptor(UnresolvedDescriptor::new(options)?, registry, mechanism))
    }

    pub const fn from_descriptor(descriptor: UnresolvedDescriptor, registry: RegistryClient, mechanism: M) -> Self {
        Self {
            descriptor,
            resolved: None,
            registry,
            mechanism,
        }
    }

    pub fn package_name(&self) -> &str {
        self.descriptor.package_name()
    }

    /// Current version: the resolved one, or the requested spec before resolution
    pub fn package_version(&self) -> &str {
        self.resolved
            .as_ref()
            .map_or_else(|| self.descriptor.version().as_str(), ResolvedDescriptor::version)
    }

    pub fn target_path(&self) -> &Path {
        self.descriptor.target_path()
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.descriptor.store_dir()
    }

    pub const fn resolved(&self) -> Option<&ResolvedDescriptor> {
        self.resolved.as_ref()
    }

    /// Resolve `latest` once and remember the answer
    pub async fn resolve(&mut self) -> Result<&mut ResolvedDescriptor> {
        let resolved = match self.resolved.take() {
            Some(resolved) => resolved,
            None => {
                let resolved = self.registry.resolve(self.descriptor.clone()).await?;
                debug!(
                    package = resolved.package_name(),
                    version = resolved.version(),
                    "resolved package version"
                );
                resolved
            }
        };
        Ok(self.resolved.insert(resolved))
    }

    /// Create the store directory and pin the version
    async fn prepare(&mut self) -> Result<PathBuf> {
        let store_dir = self.require_store_dir()?;
        ensure_directory_exists(&store_dir).await?;
        self.resolve().await?;
        Ok(store_dir)
    }

    fn require_store_dir(&self) -> Result<PathBuf> {
        self.descriptor.store_dir().map(Path::to_path_buf).ok_or_else(|| {
            ScaffoldError::ConfigError(format!(
                "{} has no store directory; local packages are managed by the operator",
                self.package_name()
            ))
        })
    }

    /// Whether the package is materialized. Store mode probes the cache
    /// entry, local mode probes the target path; never both.
    pub async fn exists(&mut self) -> Result<bool> {
        if self.descriptor.store_dir().is_none() {
            return Ok(path_exists(self.descriptor.target_path()).await);
        }

        self.prepare().await?;
        match self.cache_entry_path() {
            Some(entry) => Ok(path_exists(&entry).await),
            None => Ok(false),
        }
    }

    /// Install the current version into the store
    pub async fn install(&mut self) -> Result<()> {
        let store_dir = self.prepare().await?;
        let version = self.package_version().to_string();
        self.install_version(&store_dir, &version).await
    }

    /// Move to the registry's latest version, reusing a cached entry when present
    pub async fn update(&mut self) -> Result<UpdateOutcome> {
        let store_dir = self.prepare().await?;
        let current = self.package_version().to_string();

        let latest = self.registry.resolve_latest(self.package_name()).await?;
        let candidate = cache_entry_path(&store_dir, self.package_name(), &latest);

        let outcome = if path_exists(&candidate).await {
            debug!(package = self.package_name(), version = %latest, "latest version already cached");
            UpdateOutcome::AlreadyCached { version: latest.clone() }
        } else {
            info!(package = self.package_name(), from = %current, to = %latest, "updating package");
            self.install_version(&store_dir, &latest).await?;
            UpdateOutcome::Installed { from: current, to: latest.clone() }
        };

        self.resolve().await?.adopt_version(latest);
        Ok(outcome)
    }

    async fn install_version(&self, store_dir: &Path, version: &str) -> Result<()> {
        let request = InstallRequest {
            root: self.descriptor.target_path().to_path_buf(),
            store_dir: store_dir.to_path_buf(),
            registry: self.registry.default_registry().to_string(),
            pkgs: vec![PackageSpec {
                name: self.package_name().to_string(),
                version: version.to_string(),
            }],
        };

        info!(package = self.package_name(), version, "installing package");
        self.mechanism
            .install(&request)
            .await
            .map_err(|source| ScaffoldError::InstallError {
                package: format!("{}@{}", self.package_name(), version),
                source,
            })
    }

    /// Cache entry of the current version, when one can be named
    pub fn cache_entry_path(&self) -> Option<PathBuf> {
        if let Some(resolved) = &self.resolved {
            return resolved.cache_entry_path();
        }
        match (self.descriptor.store_dir(), self.descriptor.version()) {
            (Some(store), VersionSpec::Exact(version)) => {
                Some(cache_entry_path(store, self.package_name(), version))
            }
            _ => None,
        }
    }

    /// Directory the entry-file search starts from
    pub fn install_location(&self) -> Option<PathBuf> {
        if self.descriptor.store_dir().is_some() {
            self.cache_entry_path()
        } else {
            Some(self.descriptor.target_path().to_path_buf())
        }
    }

    /// Absolute entry file of the installed package, if it declares one
    pub fn root_file_path(&self) -> Option<PathBuf> {
        let start = self.install_location()?;
        root_file_locator::root_file_path(&start)
    }
}
