use crate::error::{Result, SyncError};
use crate::io;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use std::path::{Path, PathBuf};

pub const DEFAULT_KEEP: usize = 10;
const EXTENSION: &str = "bak";

#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
}

/// Timestamped copies of command files taken before they are overwritten or
/// deleted. Copies live under `dir/<key>/` where `key` is derived from the
/// original path; only the newest `keep` copies per key are retained.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    keep: usize,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            dir: dir.into(),
            keep: keep.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Copy `path` aside. Returns `None` when there is nothing to back up yet.
    pub fn backup(&self, path: &Path) -> Result<Option<PathBuf>> {
        if !path.is_file() {
            return Ok(None);
        }
        let folder = self.folder(path);
        io::ensure_dir(&folder)?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let mut seq = 0u32;
        let dest = loop {
            let candidate = folder.join(format!("{stamp}-{seq:03}.{EXTENSION}"));
            if !candidate.exists() {
                break candidate;
            }
            seq += 1;
        };

        std::fs::copy(path, &dest)?;
        self.prune(&folder)?;
        tracing::debug!(source = %path.display(), backup = %dest.display(), "backed up file");
        Ok(Some(dest))
    }

    /// Backups of `path`, newest first.
    pub fn list(&self, path: &Path) -> Result<Vec<BackupEntry>> {
        let mut files = io::list_files(&self.folder(path), &[EXTENSION])?;
        files.reverse();
        files
            .into_iter()
            .map(|p| {
                let created_at = io::modified_at(&p)?;
                Ok(BackupEntry {
                    path: p,
                    created_at,
                })
            })
            .collect()
    }

    /// Put the newest backup back in place. The current file, if any, is
    /// itself backed up first so the restore can be undone.
    pub fn restore(&self, path: &Path) -> Result<PathBuf> {
        let latest = self
            .list(path)?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NoBackupFound(path.to_path_buf()))?;
        let data = std::fs::read(&latest.path)?;
        self.backup(path)?;
        io::atomic_write(path, &data)?;
        tracing::info!(target_file = %path.display(), backup = %latest.path.display(), "restored backup");
        Ok(latest.path)
    }

    fn folder(&self, path: &Path) -> PathBuf {
        self.dir.join(backup_key(path))
    }

    fn prune(&self, folder: &Path) -> Result<()> {
        let files = io::list_files(folder, &[EXTENSION])?;
        if files.len() <= self.keep {
            return Ok(());
        }
        let excess = files.len() - self.keep;
        for old in &files[..excess] {
            io::remove_if_exists(old)?;
        }
        Ok(())
    }
}

/// One directory name per path: the readable file name plus a v5 UUID of the
/// full path, so distinct paths never share a folder.
fn backup_key(path: &Path) -> String {
    let name: String = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, path.as_os_str().as_encoded_bytes());
    format!("{name}-{}", digest.simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BackupManager, PathBuf) {
        let dir = TempDir::new().unwrap();
        let mgr = BackupManager::new(dir.path().join("backups"), 3);
        let file = dir.path().join("commands/review.md");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        (dir, mgr, file)
    }

    #[test]
    fn missing_file_is_noop() {
        let (_dir, mgr, file) = setup();
        assert!(mgr.backup(&file).unwrap().is_none());
        assert!(mgr.list(&file).unwrap().is_empty());
    }

    #[test]
    fn backup_copies_content() {
        let (_dir, mgr, file) = setup();
        std::fs::write(&file, "v1").unwrap();
        let copy = mgr.backup(&file).unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(copy).unwrap(), "v1");
    }

    #[test]
    fn keeps_only_newest_copies() {
        let (_dir, mgr, file) = setup();
        for i in 0..5 {
            std::fs::write(&file, format!("v{i}")).unwrap();
            mgr.backup(&file).unwrap();
        }
        let entries = mgr.list(&file).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(std::fs::read_to_string(&entries[0].path).unwrap(), "v4");
        assert_eq!(std::fs::read_to_string(&entries[2].path).unwrap(), "v2");
    }

    #[test]
    fn restore_writes_latest_back() {
        let (_dir, mgr, file) = setup();
        std::fs::write(&file, "good").unwrap();
        mgr.backup(&file).unwrap();
        std::fs::write(&file, "bad").unwrap();

        mgr.restore(&file).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "good");
        // The overwritten version is now the newest backup.
        let entries = mgr.list(&file).unwrap();
        assert_eq!(std::fs::read_to_string(&entries[0].path).unwrap(), "bad");
    }

    #[test]
    fn restore_without_backup_fails() {
        let (_dir, mgr, file) = setup();
        assert!(matches!(
            mgr.restore(&file),
            Err(SyncError::NoBackupFound(_))
        ));
    }

    #[test]
    fn keys_are_per_path() {
        assert_ne!(
            backup_key(Path::new("/a/x.md")),
            backup_key(Path::new("/b/x.md"))
        );
        assert!(backup_key(Path::new("/a/x.md")).starts_with("x.md-"));
    }

    #[test]
    fn similar_paths_keep_separate_histories() {
        let (dir, mgr, _) = setup();
        let a = dir.path().join("my_app/x.md");
        let b = dir.path().join("my/app/x.md");
        for (file, body) in [(&a, "A-content"), (&b, "B-content")] {
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, body).unwrap();
            mgr.backup(file).unwrap();
        }
        std::fs::write(&a, "broken").unwrap();

        assert_eq!(mgr.list(&a).unwrap().len(), 1);
        mgr.restore(&a).unwrap();
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "A-content");
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "B-content");
    }
}
