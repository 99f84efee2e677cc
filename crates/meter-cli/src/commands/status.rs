//! Status command for showing where data lives and how much is tracked.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;

use meter_core::format_duration;
use meter_db::Database;

use crate::Config;

/// `today` is a UTC date, matching the day keys the tracker writes.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let days = db.list_days()?;
    let today_key = today.format("%Y-%m-%d").to_string();
    let today_usage = db.day_usage(&today_key)?;
    let today_total: u64 = today_usage.iter().map(|usage| usage.seconds).sum();

    writeln!(writer, "Browsing meter status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Tracked days: {}", days.len())?;

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        writeln!(writer, "Range: {first} to {last}")?;
    }

    if today_usage.is_empty() {
        writeln!(writer, "Today: nothing tracked")?;
    } else {
        writeln!(
            writer,
            "Today: {} across {} domain(s)",
            format_duration(today_total),
            today_usage.len()
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use meter_core::AttentionConfig;

    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_command_outputs_totals() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("meter.db");
        let mut db = Database::open(&db_path).unwrap();
        db.add_seconds("2026-02-27", "docs.rs", 30).unwrap();
        db.add_seconds("2026-03-02", "github.com", 3_900).unwrap();
        db.add_seconds("2026-03-02", "docs.rs", 200).unwrap();

        let config = Config {
            database_path: db_path.clone(),
            attention: AttentionConfig::default(),
        };
        let mut output = Vec::new();
        run(&mut output, &db, &config, date(2026, 3, 2)).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/meter.db");
        assert_snapshot!(output, @r"
        Browsing meter status
        Database: [TEMP]/meter.db
        Tracked days: 2
        Range: 2026-02-27 to 2026-03-02
        Today: 1h 8m across 2 domain(s)
        ");
    }

    #[test]
    fn status_command_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let config = Config {
            database_path: "/data/meter.db".into(),
            attention: AttentionConfig::default(),
        };
        let mut output = Vec::new();
        run(&mut output, &db, &config, date(2026, 3, 2)).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Browsing meter status
        Database: /data/meter.db
        Tracked days: 0
        Today: nothing tracked
        ");
    }
}
