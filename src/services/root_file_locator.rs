use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use serde::Deserialize;
use tracing::debug;

/// Manifest file looked for while walking up from the install location
pub const MANIFEST_FILE: &str = "package.json";

/// The only manifest field the locator cares about
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Nearest directory at or above `start` that holds a manifest
pub fn find_package_dir(start: &Path) -> Option<PathBuf> {
    let start = std::path::absolute(start).ok()?;
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Absolute, normalized entry file declared by the nearest manifest.
///
/// `None` means there is nothing to execute, which is not an error.
pub fn root_file_path(start: &Path) -> Option<PathBuf> {
    let dir = find_package_dir(start)?;
    let manifest_path = dir.join(MANIFEST_FILE);

    let manifest = match read_manifest(&manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            debug!(manifest = %manifest_path.display(), error = %e, "unreadable manifest");
            return None;
        }
    };

    let main = manifest.main.filter(|main| !main.trim().is_empty())?;
    Some(format_path(&normalize(&dir.join(main))))
}

fn read_manifest(path: &Path) -> anyhow::Result<PackageManifest> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Lexically fold `.` and `..` without touching the file system
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Forward slashes on hosts that use another separator; the path ends up
/// inside a JavaScript string literal
pub fn format_path(path: &Path) -> PathBuf {
    if MAIN_SEPARATOR == '/' {
        return path.to_path_buf();
    }
    PathBuf::from(path.to_string_lossy().replace(MAIN_SEPARATOR, "/"))
}
