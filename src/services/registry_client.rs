use std::collections::HashMap;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::package::{ResolvedDescriptor, UnresolvedDescriptor, VersionSpec};
use crate::utils::config::{Config, DEFAULT_REGISTRY};
use crate::utils::validation::validate_npm_package_name;

/// npm registry client answering version queries for command packages
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// HTTP client for registry requests
    client: Client,
    /// Base URL for the registry, without a trailing slash
    registry_url: String,
    /// User agent string for requests
    user_agent: String,
}

/// Package document served at `{registry}/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryPackageResponse {
    pub name: String,
    /// All published versions with their metadata
    #[serde(default)]
    pub versions: HashMap<String, RegistryVersionInfo>,
    /// Distribution tags (latest, beta, etc.)
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
}

/// Version-specific information from the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryVersionInfo {
    pub name: String,
    pub version: String,
    pub dist: RegistryDistInfo,
}

/// Where a version's tarball lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDistInfo {
    pub tarball: String,
    pub shasum: Option<String>,
    pub integrity: Option<String>,
}

/// Registry client errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// HTTP request failed or the registry was unreachable
    #[error("Registry request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Package '{0}' not found")]
    PackageNotFound(String),

    #[error("Version '{1}' not found for package '{0}'")]
    VersionNotFound(String, String),

    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("Failed to parse registry response: {0}")]
    ParseError(String),

    #[error("Rate limited by registry")]
    RateLimited,

    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryClient {
    /// Client for the public npm registry
    pub fn new() -> Self {
        Self::with_registry_url(DEFAULT_REGISTRY.to_string())
    }

    /// Client for a custom registry URL (mirrors, tests)
    pub fn with_registry_url(registry_url: String) -> Self {
        Self::with_client(Client::new(), registry_url)
    }

    pub fn with_client(client: Client, registry_url: String) -> Self {
        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            user_agent: format!("scaffold/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Client honouring the configured registry and timeout
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        Self::with_timeout(config.registry.clone(), config.http_timeout)
    }

    pub fn with_timeout(registry_url: String, timeout: Duration) -> Result<Self, RegistryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, registry_url))
    }

    /// The registry URL handed to the install mechanism
    pub fn default_registry(&self) -> &str {
        &self.registry_url
    }

    fn package_url(&self, package_name: &str) -> String {
        // npm expects the scope separator percent-encoded
        format!("{}/{}", self.registry_url, package_name.replace('/', "%2f"))
    }

    /// Fetch the package document
    pub async fn get_package_info(&self, package_name: &str) -> Result<RegistryPackageResponse, RegistryError> {
        validate_npm_package_name(package_name).map_err(RegistryError::InvalidPackageName)?;

        let url = self.package_url(package_name);
        debug!(%url, "querying registry");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        if response.status() == 404 {
            return Err(RegistryError::PackageNotFound(package_name.to_string()));
        }

        if response.status() == 429 {
            return Err(RegistryError::RateLimited);
        }

        let response = response.error_for_status()?;

        response
            .json::<RegistryPackageResponse>()
            .await
            .map_err(|e| RegistryError::ParseError(e.to_string()))
    }

    /// Metadata of one published version
    pub async fn get_version_info(&self, package_name: &str, version: &str) -> Result<RegistryVersionInfo, RegistryError> {
        let package_info = self.get_package_info(package_name).await?;

        package_info
            .versions
            .get(version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound(package_name.to_string(), version.to_string()))
    }

    /// Newest published version: the `latest` dist-tag, else the greatest semver
    pub async fn resolve_latest(&self, package_name: &str) -> Result<String, RegistryError> {
        let package_info = self.get_package_info(package_name).await?;
        let latest = latest_version(&package_info)
            .ok_or_else(|| RegistryError::PackageNotFound(package_name.to_string()))?;
        debug!(package = package_name, %latest, "resolved latest version");
        Ok(latest)
    }

    /// Greatest published version compatible with `^current`.
    ///
    /// Having nothing newer is normal, so `current` comes back unchanged
    /// rather than as an error.
    pub async fn resolve_satisfying(&self, current: &str, package_name: &str) -> Result<String, RegistryError> {
        let package_info = self.get_package_info(package_name).await?;
        let resolved = greatest_satisfying(package_info.versions.keys().map(String::as_str), current)
            .unwrap_or_else(|| current.to_string());
        debug!(package = package_name, current, %resolved, "resolved satisfying version");
        Ok(resolved)
    }

    /// Turn an unresolved descriptor into a resolved one; exact versions
    /// never touch the network
    pub async fn resolve(&self, descriptor: UnresolvedDescriptor) -> Result<ResolvedDescriptor, RegistryError> {
        let version = match descriptor.version() {
            VersionSpec::Exact(version) => version.clone(),
            VersionSpec::Latest => self.resolve_latest(descriptor.package_name()).await?,
        };
        Ok(descriptor.into_resolved(version))
    }

    /// Stream a tarball into `dest`, returning the number of bytes written
    pub async fn download_tarball(&self, tarball_url: &str, dest: &mut tokio::fs::File) -> Result<u64, RegistryError> {
        let response = self
            .client
            .get(tarball_url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?
            .error_for_status()?;

        let mut written = 0_u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dest.flush().await?;

        debug!(url = tarball_url, bytes = written, "downloaded tarball");
        Ok(written)
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// `latest` dist-tag, falling back to the greatest parseable version
pub fn latest_version(package_info: &RegistryPackageResponse) -> Option<String> {
    if let Some(latest) = package_info.dist_tags.get("latest") {
        return Some(latest.clone());
    }

    package_info
        .versions
        .keys()
        .filter_map(|raw| Version::parse(raw).ok())
        .max()
        .map(|version| version.to_string())
}

/// Greatest version in `versions` satisfying `^current`
pub fn greatest_satisfying<'a>(versions: impl Iterator<Item = &'a str>, current: &str) -> Option<String> {
    let req = VersionReq::parse(&format!("^{}", current.trim_start_matches('v'))).ok()?;

    versions
        .filter_map(|raw| Version::parse(raw).ok())
        .filter(|version| req.matches(version))
        .max()
        .map(|version| version.to_string())
}
