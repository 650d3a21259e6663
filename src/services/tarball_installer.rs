use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use tracing::debug;

use crate::models::package::cache_entry_path;
use crate::services::package_installer::{InstallMechanism, InstallRequest, PackageSpec};
use crate::services::registry_client::RegistryClient;
use crate::utils::config::Config;
use crate::utils::fs_utils::path_exists;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Installs packages by downloading their registry tarball into the store.
///
/// Layout matches npminstall: the package lives at its cache entry path and
/// `<root>/node_modules/<name>` links to it.
#[derive(Debug, Clone)]
pub struct TarballInstaller {
    timeout: Duration,
}

impl TarballInstaller {
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub const fn from_config(config: &Config) -> Self {
        Self::with_timeout(config.http_timeout)
    }

    async fn install_one(&self, client: &RegistryClient, request: &InstallRequest, spec: &PackageSpec) -> anyhow::Result<()> {
        let entry = cache_entry_path(&request.store_dir, &spec.name, &spec.version);

        if path_exists(&entry).await {
            debug!(entry = %entry.display(), "cache entry already present");
        } else {
            self.materialize(client, request, spec, &entry).await?;
        }

        link_into_node_modules(&request.root, &spec.name, &entry)
            .with_context(|| format!("failed to link {} into node_modules", spec.name))?;
        Ok(())
    }

    async fn materialize(
        &self,
        client: &RegistryClient,
        request: &InstallRequest,
        spec: &PackageSpec,
        entry: &Path,
    ) -> anyhow::Result<()> {
        let version_info = client
            .get_version_info(&spec.name, &spec.version)
            .await
            .with_context(|| format!("failed to look up {}@{}", spec.name, spec.version))?;

        tokio::fs::create_dir_all(&request.store_dir)
            .await
            .with_context(|| format!("failed to create {}", request.store_dir.display()))?;

        let tarball = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".tgz")
            .tempfile_in(&request.store_dir)?;
        let mut file = tokio::fs::File::from_std(tarball.reopen()?);
        client
            .download_tarball(&version_info.dist.tarball, &mut file)
            .await
            .with_context(|| format!("failed to download {}", version_info.dist.tarball))?;
        drop(file);

        // extract next to the final location so the rename stays on one filesystem
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&request.store_dir)?;
        let archive_path = tarball.path().to_path_buf();
        let staging_path = staging.path().to_path_buf();
        tokio::task::spawn_blocking(move || extract_package_tarball(&archive_path, &staging_path))
            .await
            .context("extraction task panicked")??;

        if let Some(parent) = entry.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(e) = tokio::fs::rename(staging.path(), entry).await {
            // another process may have won the race for the same entry
            if !path_exists(entry).await {
                return Err(e).with_context(|| format!("failed to move package into {}", entry.display()));
            }
            debug!(entry = %entry.display(), "entry appeared concurrently, keeping it");
        }

        debug!(package = %spec.name, version = %spec.version, entry = %entry.display(), "package materialized");
        Ok(())
    }
}

impl Default for TarballInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallMechanism for TarballInstaller {
    async fn install(&self, request: &InstallRequest) -> anyhow::Result<()> {
        let client = RegistryClient::with_timeout(request.registry.clone(), self.timeout)?;
        for spec in &request.pkgs {
            self.install_one(&client, request, spec).await?;
        }
        Ok(())
    }
}

/// Unpack an npm tarball into `target_dir`, dropping the top-level
/// `package/` directory every npm tarball carries
pub fn extract_package_tarball(archive_path: &Path, target_dir: &Path) -> anyhow::Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("failed to open {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries().context("not a gzip-compressed tar archive")? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();
        if !matches!(entry_type, EntryType::Regular | EntryType::Directory) {
            debug!(?entry_type, "skipping non-regular tar entry");
            continue;
        }

        let path = entry.path()?.into_owned();
        let Some(relative) = strip_top_level(&path)? else {
            continue;
        };

        let target_path = target_dir.join(&relative);
        if entry_type == EntryType::Directory {
            std::fs::create_dir_all(&target_path)?;
            continue;
        }
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&target_path)
            .with_context(|| format!("failed to unpack {}", relative.display()))?;
    }

    Ok(())
}

/// Drop the first component; refuse anything that could escape the target
fn strip_top_level(path: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mut components = path.components();
    components.next();

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("refusing to unpack {} outside the package", path.display());
            }
        }
    }

    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Point `<root>/node_modules/<name>` at the cache entry, replacing an older link
fn link_into_node_modules(root: &Path, package_name: &str, entry: &Path) -> std::io::Result<()> {
    let link = root.join("node_modules").join(package_name);
    if link == entry {
        return Ok(());
    }

    match std::fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => symlink::remove_symlink_dir(&link)?,
        Ok(_) => {
            debug!(link = %link.display(), "real directory in place, leaving it");
            return Ok(());
        }
        Err(_) => {
            if let Some(parent) = link.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    symlink::symlink_dir(entry, &link)
}
