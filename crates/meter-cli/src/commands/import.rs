//! Import command for restoring exported days into the local `SQLite` store.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use meter_db::{Database, DayUsage};

/// Keys that look like day entries; everything else in the file is ignored.
static DAY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

pub fn run(db: &mut Database, path: &Path) -> Result<usize> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let days =
        parse_days(&contents).with_context(|| format!("invalid import file {}", path.display()))?;

    let imported = db.import_days(&days)?;
    eprintln!("Imported {imported} day(s) from {}", path.display());
    Ok(imported)
}

/// Extracts day entries from an exported JSON object.
fn parse_days(contents: &str) -> Result<DayUsage> {
    let root: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(contents).context("expected a JSON object")?;

    let mut days = DayUsage::new();
    for (key, value) in root {
        if !DAY_KEY_RE.is_match(&key) {
            tracing::debug!(key = %key, "skipping non-day key");
            continue;
        }
        let domains: BTreeMap<String, u64> = serde_json::from_value(value)
            .with_context(|| format!("day {key} must map domains to whole seconds"))?;
        days.insert(key, domains);
    }

    if days.is_empty() {
        anyhow::bail!("no valid browsing data found");
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days_skips_non_day_keys() {
        let days = parse_days(
            r#"{
                "2026-03-02": {"github.com": 45, "docs.rs": 10},
                "theme": "dark",
                "2026-3-1": {"docs.rs": 1}
            }"#,
        )
        .unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(days["2026-03-02"]["github.com"], 45);
        assert_eq!(days["2026-03-02"]["docs.rs"], 10);
    }

    #[test]
    fn test_parse_days_requires_at_least_one_day() {
        let err = parse_days(r#"{"theme": "dark"}"#).unwrap_err();
        assert!(err.to_string().contains("no valid browsing data"));
    }

    #[test]
    fn test_parse_days_rejects_non_objects() {
        assert!(parse_days("[1, 2, 3]").is_err());
        assert!(parse_days(r#"{"2026-03-02": {"github.com": -5}}"#).is_err());
    }

    #[test]
    fn test_import_overwrites_matching_day() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("backup.json");
        fs::write(&path, r#"{"2026-03-02": {"docs.rs": 600}}"#).unwrap();

        let mut db = Database::open_in_memory().unwrap();
        db.add_seconds("2026-03-02", "github.com", 45).unwrap();
        db.add_seconds("2026-03-01", "github.com", 5).unwrap();

        assert_eq!(run(&mut db, &path).unwrap(), 1);

        let exported = db.export_all().unwrap();
        assert_eq!(exported["2026-03-02"].len(), 1);
        assert_eq!(exported["2026-03-02"]["docs.rs"], 600);
        assert_eq!(exported["2026-03-01"]["github.com"], 5);
    }

    #[test]
    fn test_import_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open_in_memory().unwrap();
        assert!(run(&mut db, &temp.path().join("missing.json")).is_err());
    }
}
