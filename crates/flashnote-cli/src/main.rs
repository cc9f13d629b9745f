mod cmd_capture;
mod cmd_config;
mod cmd_flush;
mod cmd_inbox;
mod cmd_pending;
mod cmd_respond;
mod session;

use clap::{Parser, Subcommand};
use flashnote_core::RecordStatus;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "flashnote",
    version,
    about = "Capture a thought in seconds, see it again when it matters"
)]
struct Cli {
    /// Store root (default: $FLASHNOTE_HOME, else the platform data dir)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a thought to the capture buffer
    Capture {
        /// Note text
        text: String,
        /// Where it came from: typed, voice, shared, assistant, companion-device, widget
        #[arg(long, default_value = "typed")]
        source: String,
        /// Audio attachment reference for voice captures
        #[arg(long)]
        audio: Option<String>,
    },
    /// Move buffered captures into the note store and schedule reminders
    Flush,
    /// List notes waiting for triage
    Inbox {
        /// Include triaged and non-active notes
        #[arg(long)]
        all: bool,
        /// Only notes with this status (active, archived, task, deleted)
        #[arg(long)]
        status: Option<RecordStatus>,
        /// Maximum number of notes (0 = unlimited)
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show scheduled reminders
    Pending {
        /// Only reminders whose time has come
        #[arg(long)]
        due: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer a reminder: keep, archive, or snooze
    Respond {
        note_id: Uuid,
        action: String,
    },
    /// Change a note's status or triage flag
    Mark {
        note_id: Uuid,
        #[arg(long)]
        status: Option<RecordStatus>,
        #[arg(long, conflicts_with = "untriaged")]
        triaged: bool,
        #[arg(long)]
        untriaged: bool,
    },
    /// Manage settings in config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flashnote=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let root = cli.root.unwrap_or_else(flashnote_store::store_root);

    match cli.cmd {
        Command::Capture {
            text,
            source,
            audio,
        } => cmd_capture::execute(&root, &text, &source, audio.as_deref()),
        Command::Flush => cmd_flush::execute(&root),
        Command::Inbox {
            all,
            status,
            limit,
            json,
        } => cmd_inbox::execute(&cmd_inbox::InboxParams {
            root: &root,
            all,
            status,
            limit,
            json,
        }),
        Command::Pending { due, json } => cmd_pending::execute(&root, due, json),
        Command::Respond { note_id, action } => cmd_respond::execute(&root, note_id, &action),
        Command::Mark {
            note_id,
            status,
            triaged,
            untriaged,
        } => {
            let triage = match (triaged, untriaged) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_respond::mark(&root, note_id, status, triage)
        }
        Command::Config { cmd } => cmd_config::run(cmd, &root),
    }
}
