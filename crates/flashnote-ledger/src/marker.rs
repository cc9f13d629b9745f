use flashnote_store::{remove_if_exists, write_atomic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use uuid::Uuid;

const MARKER_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct MarkerFile {
    version: u32,
    flushed_ids: Vec<Uuid>,
}

/// Ids already committed to the note store by a flush that has not yet
/// cleared the capture buffer.
///
/// Written between commit and clear; a flush that finds it on disk knows the
/// previous run crashed in that window and skips those ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushedIdSet {
    ids: BTreeSet<Uuid>,
}

impl FlushedIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the marker. A missing file is an empty set; a corrupt one, or a
    /// directory squatting on the path, is logged and treated as empty.
    pub fn load(path: &Path) -> io::Result<Self> {
        if path.is_dir() {
            tracing::warn!(path = %path.display(), "flush marker path is a directory, ignoring it");
            return Ok(Self::default());
        }
        let content = match std::fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        match serde_json::from_slice::<MarkerFile>(&content) {
            Ok(file) => Ok(Self {
                ids: file.flushed_ids.into_iter().collect(),
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt flush marker");
                Ok(Self::default())
            }
        }
    }

    /// Durably replace the marker on disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file = MarkerFile {
            version: MARKER_VERSION,
            flushed_ids: self.ids.iter().copied().collect(),
        };
        let json = serde_json::to_vec(&file)?;
        write_atomic(path, &json)
    }

    /// Delete the marker. Missing is fine.
    pub fn remove(path: &Path) -> io::Result<()> {
        remove_if_exists(path)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: Uuid) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.ids.iter()
    }
}

impl Extend<Uuid> for FlushedIdSet {
    fn extend<T: IntoIterator<Item = Uuid>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}

impl FromIterator<Uuid> for FlushedIdSet {
    fn from_iter<T: IntoIterator<Item = Uuid>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
