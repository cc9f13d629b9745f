use anyhow::Context;
use flashnote_core::{CaptureEntry, SourceTag};
use flashnote_ledger::EntryLog;
use flashnote_store::StorePaths;
use std::path::Path;

/// `flashnote capture <text>`: append to the hot buffer. Never touches the
/// note store, so it stays fast and safe to run from any process.
pub fn execute(root: &Path, text: &str, source: &str, audio: Option<&str>) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("nothing to capture");
    }
    let source = SourceTag::parse(source).unwrap_or_else(|| {
        tracing::warn!(source, "unknown source, recording as typed");
        SourceTag::Typed
    });

    let paths = StorePaths::discover(root);
    paths.ensure_layout()?;
    let entry = CaptureEntry::new(text, source, audio.map(str::to_string));
    EntryLog::open(&paths)
        .append(&entry)
        .context("couldn't save that thought")?;

    println!("Captured {}", entry.id());
    Ok(())
}
