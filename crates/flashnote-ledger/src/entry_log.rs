use flashnote_core::CaptureEntry;
use flashnote_store::{lock_file, remove_if_exists, sync_dir, LockGuard, StorePaths};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Errors surfaced to producers and to the flush path.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("cannot encode entry {id}: {source}")]
    Encode {
        id: Uuid,
        source: serde_json::Error,
    },
    #[error("cannot lock capture buffer ({}): {source}", path.display())]
    Lock { path: PathBuf, source: io::Error },
    #[error("capture buffer I/O failed ({}): {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// The hot capture buffer: one JSON-encoded [`CaptureEntry`] per line in a
/// file shared by every producer process.
///
/// `append`, `read_all` and `clear` all hold the same exclusive lock on a
/// sibling lock file. The lock lives in its own file so that `clear` can
/// delete the buffer without invalidating a lock someone else is waiting on.
#[derive(Debug, Clone)]
pub struct EntryLog {
    path: PathBuf,
    lock_path: PathBuf,
}

impl EntryLog {
    pub fn new(path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_path: lock_path.into(),
        }
    }

    /// The buffer at its standard location under the store root.
    pub fn open(paths: &StorePaths) -> Self {
        Self::new(&paths.buffer_jsonl, &paths.buffer_lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one entry. Returns only after the line is on stable storage.
    pub fn append(&self, entry: &CaptureEntry) -> Result<(), LogError> {
        let mut line = serde_json::to_string(entry).map_err(|source| LogError::Encode {
            id: entry.id(),
            source,
        })?;
        line.push('\n');

        let _guard = self.lock()?;
        self.write_line(line.as_bytes())
            .map_err(|source| self.io_error(source))?;

        tracing::debug!(entry_id = %entry.id(), source = %entry.source(), "appended entry to capture buffer");
        Ok(())
    }

    /// Read every decodable entry in append order. Undecodable lines (torn
    /// writes, foreign garbage) are skipped.
    pub fn read_all(&self) -> Result<Vec<CaptureEntry>, LogError> {
        let _guard = self.lock()?;
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(decode_lines(&bytes))
    }

    /// Delete the buffer. A missing buffer is not an error.
    pub fn clear(&self) -> Result<(), LogError> {
        let _guard = self.lock()?;
        remove_if_exists(&self.path).map_err(|source| self.io_error(source))?;
        tracing::debug!(path = %self.path.display(), "capture buffer cleared");
        Ok(())
    }

    fn lock(&self) -> Result<LockGuard, LogError> {
        lock_file(&self.lock_path).map_err(|source| LogError::Lock {
            path: self.lock_path.clone(),
            source,
        })
    }

    fn io_error(&self, source: io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }
        let created = !self.path.exists();

        // O_APPEND | O_CREAT: creation is atomic and every write lands at the end.
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // A crash mid-append leaves a line without its terminator; close it off
        // so the torn record cannot swallow this one.
        if ends_with_torn_record(&mut file)? {
            file.write_all(b"\n")?;
        }
        file.write_all(line)?;
        file.sync_all()?;

        if created {
            if let Some(parent) = parent {
                sync_dir(parent)?;
            }
        }
        Ok(())
    }
}

fn ends_with_torn_record(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn decode_lines(bytes: &[u8]) -> Vec<CaptureEntry> {
    let mut entries = Vec::new();
    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = raw.trim_ascii();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<CaptureEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipped corrupt capture buffer entry");
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use flashnote_core::SourceTag;
    use std::sync::Arc;

    fn setup() -> (tempfile::TempDir, EntryLog) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path());
        (tmp, EntryLog::open(&paths))
    }

    fn entry(text: &str) -> CaptureEntry {
        CaptureEntry::new(text, SourceTag::Typed, None)
    }

    #[test]
    fn read_before_any_append_is_empty() {
        let (_tmp, log) = setup();
        assert!(log.read_all().unwrap().is_empty());
        assert!(!log.path().exists());
    }

    #[test]
    fn append_then_read_preserves_every_field() {
        let (_tmp, log) = setup();
        let at = DateTime::parse_from_rfc3339("2026-05-04T23:15:07.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        let e = CaptureEntry::with_timestamp(
            "call mom\nabout sunday",
            SourceTag::CompanionDevice,
            Some("clip-1.m4a".to_string()),
            at,
        );
        log.append(&e).unwrap();

        let all = log.read_all().unwrap();
        assert_eq!(all, vec![e]);
    }

    #[test]
    fn reads_in_append_order() {
        let (_tmp, log) = setup();
        let entries: Vec<_> = (0..20).map(|i| entry(&format!("thought {i}"))).collect();
        for e in &entries {
            log.append(e).unwrap();
        }
        assert_eq!(log.read_all().unwrap(), entries);
    }

    #[test]
    fn one_entry_is_one_physical_line() {
        let (_tmp, log) = setup();
        log.append(&entry("a\nb\nc")).unwrap();
        log.append(&entry("d")).unwrap();
        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn corrupt_line_between_good_entries_is_skipped() {
        let (_tmp, log) = setup();
        let first = entry("first");
        let second = entry("second");
        log.append(&first).unwrap();
        {
            let mut f = OpenOptions::new().append(true).open(log.path()).unwrap();
            f.write_all(b"{\"id\": \"not-a-uuid\", garbage\n").unwrap();
        }
        log.append(&second).unwrap();

        assert_eq!(log.read_all().unwrap(), vec![first, second]);
    }

    #[test]
    fn torn_trailing_write_does_not_swallow_next_append() {
        let (_tmp, log) = setup();
        let first = entry("first");
        log.append(&first).unwrap();
        {
            // Simulate a crash halfway through writing a record.
            let mut f = OpenOptions::new().append(true).open(log.path()).unwrap();
            f.write_all(b"{\"id\":\"6f1c").unwrap();
        }
        assert_eq!(log.read_all().unwrap(), vec![first.clone()]);

        let next = entry("after crash");
        log.append(&next).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![first, next]);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let (_tmp, log) = setup();
        let good = entry("good");
        {
            let mut f = File::create(log.path()).unwrap();
            f.write_all(&[0xff, 0xfe, 0xfd, b'\n']).unwrap();
        }
        log.append(&good).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![good]);
    }

    #[test]
    fn clear_empties_log_and_tolerates_missing_file() {
        let (_tmp, log) = setup();
        log.clear().unwrap();
        log.append(&entry("x")).unwrap();
        log.clear().unwrap();
        assert!(log.read_all().unwrap().is_empty());
        assert!(!log.path().exists());

        let after = entry("after clear");
        log.append(&after).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![after]);
    }

    #[test]
    fn duplicate_ids_are_stored_as_given() {
        let (_tmp, log) = setup();
        let e = entry("twice");
        log.append(&e).unwrap();
        log.append(&e).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![e.clone(), e]);
    }

    #[test]
    fn concurrent_producers_never_interleave_lines() {
        let (_tmp, log) = setup();
        let log = Arc::new(log);
        let long = "x".repeat(8 * 1024);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                let long = long.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let e = CaptureEntry::new(&format!("{t}-{i}-{long}"), SourceTag::Widget, None);
                        log.append(&e).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 200);
        // Per-producer order survives even though producers interleave.
        for t in 0..8 {
            let seq: Vec<usize> = all
                .iter()
                .filter_map(|e| {
                    let mut parts = e.text().splitn(3, '-');
                    let producer: usize = parts.next()?.parse().ok()?;
                    let n: usize = parts.next()?.parse().ok()?;
                    (producer == t).then_some(n)
                })
                .collect();
            assert_eq!(seq, (0..25).collect::<Vec<_>>());
        }
    }
}
