use semver::Version;
use tracing::{debug, warn};

use crate::services::registry_client::{RegistryClient, RegistryError};

/// Registry name under which this CLI itself is published
pub const SELF_PACKAGE: &str = "@scaffold-cli/core";

/// Newer compatible release of `package_name`, if the registry has one
pub async fn newer_release(
    registry: &RegistryClient,
    package_name: &str,
    current: &str,
) -> Result<Option<String>, RegistryError> {
    let candidate = registry.resolve_satisfying(current, package_name).await?;
    Ok(is_newer(&candidate, current).then_some(candidate))
}

fn is_newer(candidate: &str, current: &str) -> bool {
    match (Version::parse(candidate), Version::parse(current)) {
        (Ok(candidate), Ok(current)) => candidate > current,
        _ => false,
    }
}

/// Startup check for a newer CLI release; failures never stop the command
pub async fn check_for_update(registry: &RegistryClient) {
    let current = env!("CARGO_PKG_VERSION");
    match newer_release(registry, SELF_PACKAGE, current).await {
        Ok(Some(latest)) => warn!(
            "a newer {SELF_PACKAGE} is available: current {current}, latest {latest}. \
             Update with: npm install -g {SELF_PACKAGE}"
        ),
        Ok(None) => debug!(current, "scaffold is up to date"),
        Err(e) => debug!(error = %e, "skipping update check"),
    }
}
