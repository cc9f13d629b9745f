pub mod config;
pub mod paths;

pub use config::FlashConfig;
pub use paths::StorePaths;

use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the store root.
pub const HOME_ENV: &str = "FLASHNOTE_HOME";

/// Return the shared store root every producer process agrees on.
/// `$FLASHNOTE_HOME`, else the platform data dir (`~/.local/share/flashnote`,
/// `%APPDATA%\flashnote`), else `~/.flashnote`.
pub fn store_root() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        PathBuf::from(home)
    } else if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("flashnote")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".flashnote")
    } else {
        PathBuf::from(".flashnote")
    }
}

/// Atomic write: write to temp file in same dir, fsync, rename over `path`,
/// then fsync the directory so the rename itself survives a crash.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    sync_dir(parent)?;
    Ok(())
}

/// Flush directory metadata (new or renamed entries) to disk.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Remove `path`, treating a missing file as success.
pub fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// File-based exclusive lock guard. Released on drop.
pub struct LockGuard {
    file: fs::File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release file lock");
        }
    }
}

/// Acquire an exclusive file lock, blocking until it is free. Creates the lock
/// file if needed.
///
/// Each call opens its own handle, so the lock excludes other threads of this
/// process as well as other processes.
pub fn lock_file(path: &Path) -> std::io::Result<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(LockGuard { file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn store_root_is_not_empty() {
        let root = store_root();
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn write_atomic_creates_file_and_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("test.txt");
        write_atomic(&path, b"hello world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn write_atomic_replaces_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("marker.json");
        write_atomic(&path, b"{}").unwrap();
        write_atomic(&path, b"{\"v\":2}").unwrap();
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["marker.json"]);
    }

    #[test]
    fn sync_dir_accepts_existing_dir_and_rejects_missing() {
        let tmp = tempfile::tempdir().unwrap();
        sync_dir(tmp.path()).unwrap();
        if cfg!(unix) {
            assert!(sync_dir(&tmp.path().join("missing")).is_err());
        }
    }

    #[test]
    fn remove_if_exists_tolerates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gone.txt");
        remove_if_exists(&path).unwrap();
        fs::write(&path, "x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn lock_file_acquires_and_drops() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = tmp.path().join("test.lock");
        let guard = lock_file(&lock_path).unwrap();
        assert!(lock_path.exists());
        drop(guard);
        let _again = lock_file(&lock_path).unwrap();
    }

    #[test]
    fn lock_file_excludes_other_threads() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = tmp.path().join("test.lock");
        let guard = lock_file(&lock_path).unwrap();

        let acquired = Arc::new(AtomicBool::new(false));
        let handle = {
            let acquired = Arc::clone(&acquired);
            let lock_path = lock_path.clone();
            std::thread::spawn(move || {
                let _g = lock_file(&lock_path).unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        assert!(!acquired.load(Ordering::SeqCst));
        drop(guard);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }
}
