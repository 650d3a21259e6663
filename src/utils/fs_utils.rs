// File system utilities

use std::path::Path;

use tokio::fs;

/// Create `path` and its parents if missing; an existing directory is left alone
pub async fn ensure_directory_exists(path: &Path) -> std::io::Result<()> {
    if !fs::try_exists(path).await? {
        fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Async existence probe that treats permission errors as "absent"
pub async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
