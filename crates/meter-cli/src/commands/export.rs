//! Implementation of the `meter export` command.
//!
//! Writes every tracked day as one pretty-printed JSON object keyed by
//! `YYYY-MM-DD`, each mapping domain to seconds. The same shape is accepted
//! by `meter import`.

use std::fs;
use std::io::{Write, stdout};
use std::path::Path;

use anyhow::{Context, Result};

use meter_db::{Database, DayUsage};

/// Serializes exported days.
pub fn format_export(days: &DayUsage) -> Result<String> {
    serde_json::to_string_pretty(days).context("failed to serialize tracked days")
}

/// Run the export command.
///
/// Returns the number of days exported. Nothing is written when there is
/// no data.
pub fn run(db: &Database, output: Option<&Path>) -> Result<usize> {
    let days = db.export_all()?;
    if days.is_empty() {
        eprintln!("No tracked data to export.");
        return Ok(0);
    }

    let json = format_export(&days)?;
    match output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Exported {} day(s) to {}", days.len(), path.display());
        }
        None => {
            let mut out = stdout().lock();
            writeln!(out, "{json}").context("failed to write export")?;
        }
    }
    Ok(days.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn test_export_is_keyed_by_day_then_domain() {
        let mut db = Database::open_in_memory().unwrap();
        db.add_seconds("2026-03-02", "github.com", 45).unwrap();
        db.add_seconds("2026-03-01", "docs.rs", 90).unwrap();
        db.add_seconds("2026-03-02", "crates.io", 5).unwrap();

        assert_snapshot!(format_export(&db.export_all().unwrap()).unwrap(), @r#"
        {
          "2026-03-01": {
            "docs.rs": 90
          },
          "2026-03-02": {
            "crates.io": 5,
            "github.com": 45
          }
        }
        "#);
    }

    #[test]
    fn test_export_writes_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("export.json");
        let mut db = Database::open_in_memory().unwrap();
        db.add_seconds("2026-03-02", "github.com", 45).unwrap();

        assert_eq!(run(&db, Some(&path)).unwrap(), 1);
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#""github.com": 45"#));
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("export.json");
        let db = Database::open_in_memory().unwrap();

        assert_eq!(run(&db, Some(&path)).unwrap(), 0);
        assert!(!path.exists());
    }
}
