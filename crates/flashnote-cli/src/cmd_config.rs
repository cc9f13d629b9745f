use chrono::Utc;
use clap::Subcommand;
use flashnote_resurface::schedule_from_config;
use flashnote_store::{FlashConfig, StorePaths};
use std::path::Path;

use crate::session::Session;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. quiet_hours_start)
        key: String,
        /// Config value (true/false/number, or comma-separated days for interval_days)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values, including defaults
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(root, &key, &value),
        ConfigCmd::Get { key } => get(root, &key),
        ConfigCmd::List => list(root),
    }
}

// ── Command Implementations ──

/// Read `config.json` as a raw map. Returns an empty map if the file doesn't exist.
fn read_config(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

fn write_config(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    flashnote_store::write_atomic(path, json.as_bytes())
}

/// Parse a string value into the JSON shape the key expects.
fn parse_value(key: &str, s: &str) -> anyhow::Result<serde_json::Value> {
    let value = match key {
        "quiet_hours_enabled" | "daily_reflection_enabled" => match s {
            "true" | "on" | "yes" => serde_json::Value::Bool(true),
            "false" | "off" | "no" => serde_json::Value::Bool(false),
            _ => anyhow::bail!("{key} expects true or false, got '{s}'"),
        },
        "interval_days" => {
            let days = s
                .split(',')
                .map(|d| d.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow::anyhow!("{key} expects comma-separated days: {e}"))?;
            serde_json::json!(days)
        }
        _ => {
            let n: u32 = s
                .parse()
                .map_err(|e| anyhow::anyhow!("{key} expects a non-negative integer: {e}"))?;
            serde_json::json!(n)
        }
    };
    Ok(value)
}

fn ensure_known(key: &str) -> anyhow::Result<()> {
    if !FlashConfig::KEYS.contains(&key) {
        anyhow::bail!(
            "unknown config key '{key}' (known: {})",
            FlashConfig::KEYS.join(", ")
        );
    }
    Ok(())
}

/// `flashnote config set <key> <value>`
pub fn set(root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    ensure_known(key)?;
    let paths = StorePaths::discover(root);
    paths.ensure_layout()?;

    let mut config = read_config(&paths.config_json)?;
    config.insert(key.to_string(), parse_value(key, value)?);

    // Reject values that would make the schedule unusable before saving them.
    let parsed: FlashConfig = serde_json::from_value(serde_json::Value::Object(config.clone()))?;
    if let Err(e) = schedule_from_config(&parsed) {
        anyhow::bail!("invalid value for {key}: {e}");
    }

    write_config(&paths.config_json, &config)?;
    println!("{key} = {}", config[key]);
    if key == "daily_reflection_enabled" {
        Session::open(root)?.sync_daily_reflection(Utc::now());
    }
    Ok(())
}

/// `flashnote config get <key>`
pub fn get(root: &Path, key: &str) -> anyhow::Result<()> {
    ensure_known(key)?;
    let paths = StorePaths::discover(root);
    let effective = serde_json::to_value(FlashConfig::load(&paths))?;
    match effective.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `flashnote config list`
pub fn list(root: &Path) -> anyhow::Result<()> {
    let paths = StorePaths::discover(root);
    let explicit = read_config(&paths.config_json)?;
    let effective = serde_json::to_value(FlashConfig::load(&paths))?;
    for key in FlashConfig::KEYS {
        let val = effective.get(key).cloned().unwrap_or_default();
        let marker = if explicit.contains_key(key) { "" } else { "  (default)" };
        println!("{key} = {val}{marker}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_by_key() {
        assert_eq!(
            parse_value("quiet_hours_enabled", "off").unwrap(),
            serde_json::Value::Bool(false)
        );
        assert_eq!(
            parse_value("interval_days", "1, 2,5").unwrap(),
            serde_json::json!([1, 2, 5])
        );
        assert_eq!(
            parse_value("quiet_hours_start", "23").unwrap(),
            serde_json::json!(23)
        );
        assert!(parse_value("quiet_hours_start", "-1").is_err());
        assert!(parse_value("quiet_hours_enabled", "maybe").is_err());
        assert_eq!(
            parse_value("daily_reflection_enabled", "on").unwrap(),
            serde_json::Value::Bool(true)
        );
    }

    #[test]
    fn set_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        set(tmp.path(), "max_daily_notifications", "5").unwrap();
        set(tmp.path(), "interval_days", "2,4").unwrap();
        let cfg = FlashConfig::load(&StorePaths::discover(tmp.path()));
        assert_eq!(cfg.max_daily_notifications, 5);
        assert_eq!(cfg.interval_days, vec![2, 4]);
        assert_eq!(cfg.quiet_hours_start, 22);
    }

    #[test]
    fn toggling_daily_reflection_arms_and_cancels_it() {
        use flashnote_resurface::{FileDeliveryQueue, DAILY_REFLECTION_ID};
        let tmp = tempfile::tempdir().unwrap();
        let queue = FileDeliveryQueue::open(&StorePaths::discover(tmp.path()));

        set(tmp.path(), "daily_reflection_enabled", "true").unwrap();
        let pending = queue.all().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reminder_id, DAILY_REFLECTION_ID);
        assert!(pending[0].fire_at > Utc::now());

        set(tmp.path(), "daily_reflection_enabled", "false").unwrap();
        assert!(queue.all().unwrap().is_empty());
    }

    #[test]
    fn invalid_values_are_not_saved() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(set(tmp.path(), "quiet_hours_end", "24").is_err());
        assert!(set(tmp.path(), "interval_days", "3,0").is_err());
        assert!(set(tmp.path(), "no_such_key", "1").is_err());
        assert!(!StorePaths::discover(tmp.path()).config_json.exists());
    }
}
