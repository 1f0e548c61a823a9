//! Filesystem helpers shared by snapshots, state files and artifacts.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Write `bytes` to `path` through a sibling temporary file and a rename, so
/// the destination holds either the old contents or the new ones. Missing
/// parent directories are created.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let partial = partial_path(path);
    if let Err(e) = fs::write(&partial, bytes).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e);
    }

    fs::rename(&partial, path).await
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/card.jpg");

        write_atomic(&path, b"first").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("a/b/card.jpg.part").exists());
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/x/.states.json")),
            PathBuf::from("/x/.states.json.part")
        );
    }
}
