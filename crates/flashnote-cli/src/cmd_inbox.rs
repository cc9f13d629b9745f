use flashnote_core::{CanonicalRecord, CanonicalStore, RecordFilter, RecordStatus};
use std::path::Path;

use crate::session::Session;

pub struct InboxParams<'a> {
    pub root: &'a Path,
    pub all: bool,
    pub status: Option<RecordStatus>,
    pub limit: usize,
    pub json: bool,
}

/// `flashnote inbox`: untriaged active notes, oldest first.
pub fn execute(params: &InboxParams<'_>) -> anyhow::Result<()> {
    let session = Session::open(params.root)?;
    let records = session.store.query(&filter_for(params))?;

    if params.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("(inbox empty)");
        return Ok(());
    }
    for r in &records {
        println!("{}", format_line(r));
    }
    Ok(())
}

fn filter_for(params: &InboxParams<'_>) -> RecordFilter {
    let mut filter = match (params.all, params.status) {
        (_, Some(status)) => RecordFilter::with_status(status),
        (true, None) => RecordFilter::all(),
        (false, None) => RecordFilter::inbox(),
    };
    filter.limit = (params.limit > 0).then_some(params.limit);
    filter
}

fn format_line(r: &CanonicalRecord) -> String {
    let mut flags = String::new();
    if r.status != RecordStatus::Active {
        flags.push_str(&format!(" [{}]", r.status));
    }
    if r.is_triaged {
        flags.push_str(" [triaged]");
    }
    let first_line = r.text.lines().next().unwrap_or_default();
    format!(
        "{}  {}  ({}, seen {}x){}  {}",
        r.id,
        r.created_at.format("%Y-%m-%d %H:%M"),
        r.source,
        r.resurface_count,
        flags,
        first_line
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flashnote_core::{CaptureEntry, SourceTag};

    fn params(all: bool, status: Option<RecordStatus>, limit: usize) -> InboxParams<'static> {
        InboxParams {
            root: Path::new("."),
            all,
            status,
            limit,
            json: false,
        }
    }

    #[test]
    fn filter_selection() {
        assert_eq!(filter_for(&params(false, None, 0)), RecordFilter::inbox());
        assert_eq!(filter_for(&params(true, None, 0)), RecordFilter::all());
        let archived = filter_for(&params(false, Some(RecordStatus::Archived), 5));
        assert_eq!(archived.status, Some(RecordStatus::Archived));
        assert_eq!(archived.limit, Some(5));
    }

    #[test]
    fn line_shows_first_line_and_flags() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 0).unwrap();
        let mut r = CanonicalRecord::from_entry(&CaptureEntry::with_timestamp(
            "groceries\neggs\nbread",
            SourceTag::Shared,
            None,
            at,
        ));
        r.status = RecordStatus::Task;
        let line = format_line(&r);
        assert!(line.contains("2026-01-02 03:04"));
        assert!(line.contains("(shared, seen 0x) [task]"));
        assert!(line.ends_with("groceries"));
    }
}
