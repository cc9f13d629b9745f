use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Maximum number of characters kept from a captured text.
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Appended to texts cut at [`MAX_TEXT_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Where a thought was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTag {
    Typed,
    Voice,
    Shared,
    Assistant,
    CompanionDevice,
    Widget,
}

impl SourceTag {
    pub const ALL: [SourceTag; 6] = [
        SourceTag::Typed,
        SourceTag::Voice,
        SourceTag::Shared,
        SourceTag::Assistant,
        SourceTag::CompanionDevice,
        SourceTag::Widget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Typed => "typed",
            SourceTag::Voice => "voice",
            SourceTag::Shared => "shared",
            SourceTag::Assistant => "assistant",
            SourceTag::CompanionDevice => "companion-device",
            SourceTag::Widget => "widget",
        }
    }

    /// Parse a tag, returning `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Parse a tag written by any producer version. Unknown tags read as `Typed`
    /// so a newer producer never makes an older reader drop the entry.
    pub fn parse_lossy(s: &str) -> Self {
        Self::parse(s).unwrap_or(SourceTag::Typed)
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SourceTag::parse_lossy(&raw))
    }
}

/// One captured thought awaiting reconciliation into the note store.
///
/// Entries are immutable once built and identified by `id`, which producers
/// generate independently (random UUIDv4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEntry {
    id: Uuid,
    text: String,
    source: SourceTag,
    captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_ref: Option<String>,
}

impl CaptureEntry {
    /// Capture `text` now.
    pub fn new(text: &str, source: SourceTag, audio_ref: Option<String>) -> Self {
        Self::with_timestamp(text, source, audio_ref, Utc::now())
    }

    /// Capture `text` with an explicit timestamp.
    pub fn with_timestamp(
        text: &str,
        source: SourceTag,
        audio_ref: Option<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: cap_text(text),
            source,
            captured_at,
            audio_ref,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> SourceTag {
        self.source
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn audio_ref(&self) -> Option<&str> {
        self.audio_ref.as_deref()
    }
}

fn cap_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((cut, _)) => {
            let mut capped = String::with_capacity(cut + TRUNCATION_MARKER.len());
            capped.push_str(&text[..cut]);
            capped.push_str(TRUNCATION_MARKER);
            capped
        }
        None => text.to_string(),
    }
}

/// Lifecycle state of a note in the canonical store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Archived,
    Task,
    Deleted,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Archived => "archived",
            RecordStatus::Task => "task",
            RecordStatus::Deleted => "deleted",
        }
    }

    /// Unknown values read as `Active`.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "archived" => RecordStatus::Archived,
            "task" => RecordStatus::Task,
            "deleted" => RecordStatus::Deleted,
            _ => RecordStatus::Active,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordStatus::Active),
            "archived" => Ok(RecordStatus::Archived),
            "task" => Ok(RecordStatus::Task),
            "deleted" => Ok(RecordStatus::Deleted),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// A note as held by the canonical store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: Uuid,
    pub text: String,
    pub source: SourceTag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: RecordStatus,
    /// Signed so that out-of-range values written by other tools stay
    /// representable; negative counts never resurface.
    pub resurface_count: i64,
    pub is_triaged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
}

impl CanonicalRecord {
    /// Build the record for a flushed entry. The record keeps the entry id and
    /// is dated at capture time, not flush time.
    pub fn from_entry(entry: &CaptureEntry) -> Self {
        Self {
            id: entry.id(),
            text: entry.text().to_string(),
            source: entry.source(),
            created_at: entry.captured_at(),
            updated_at: entry.captured_at(),
            status: RecordStatus::Active,
            resurface_count: 0,
            is_triaged: false,
            audio_ref: entry.audio_ref().map(str::to_string),
        }
    }
}
