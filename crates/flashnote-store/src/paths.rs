use std::path::{Path, PathBuf};

/// All well-known paths under the shared store root.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub buffer_jsonl: PathBuf,
    pub buffer_lock: PathBuf,
    pub flushed_ids_json: PathBuf,
    pub notes_db: PathBuf,
    pub reminders_json: PathBuf,
    pub reminders_lock: PathBuf,
    pub config_json: PathBuf,
    pub audio_dir: PathBuf,
}

impl StorePaths {
    /// Derive all paths from a store root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            buffer_jsonl: root.join("hot_capture_buffer.jsonl"),
            buffer_lock: root.join("hot_capture_buffer.lock"),
            flushed_ids_json: root.join("flushed_ids.json"),
            notes_db: root.join("notes.db"),
            reminders_json: root.join("reminders.json"),
            reminders_lock: root.join("reminders.lock"),
            config_json: root.join("config.json"),
            audio_dir: root.join("audio"),
            root,
        }
    }

    /// Create the root and audio directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [&self.root, &self.audio_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Location of an audio attachment referenced by an entry.
    pub fn audio_file(&self, file_name: &str) -> PathBuf {
        self.audio_dir.join(file_name)
    }

    pub fn is_initialized(&self) -> bool {
        self.root.is_dir()
    }
}

impl AsRef<Path> for StorePaths {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}
