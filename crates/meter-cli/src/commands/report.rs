//! Report command: time per domain for one day.

use std::fmt::Write;

use anyhow::Result;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

use meter_core::{day_label, format_duration};
use meter_db::{Database, DomainUsage};

/// Which day to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelection {
    Today,
    DaysAgo(u32),
    Date(NaiveDate),
}

impl DaySelection {
    /// Resolves the selection against `today`.
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::DaysAgo(days) => today
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            Self::Date(date) => date,
        }
    }
}

/// Report data for one day.
#[derive(Debug)]
pub struct ReportData {
    pub day: NaiveDate,
    pub label: String,
    /// Domains, most time first.
    pub domains: Vec<DomainUsage>,
}

impl ReportData {
    pub fn total_seconds(&self) -> u64 {
        self.domains.iter().map(|usage| usage.seconds).sum()
    }
}

/// Loads report data for the selected day.
pub fn generate_report_data(
    db: &Database,
    selection: DaySelection,
    today: NaiveDate,
) -> Result<ReportData> {
    let day = selection.resolve(today);
    let domains = db.day_usage(&day.format("%Y-%m-%d").to_string())?;
    Ok(ReportData {
        day,
        label: day_label(day, today),
        domains,
    })
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    writeln!(output, "TIME REPORT: {} ({})", data.label, data.day).unwrap();
    writeln!(output).unwrap();

    if data.domains.is_empty() {
        writeln!(output, "No activity tracked.").unwrap();
        return output;
    }

    let width = data
        .domains
        .iter()
        .map(|usage| usage.domain.len())
        .max()
        .unwrap_or(0)
        .max("Total".len());

    for usage in &data.domains {
        let duration = format_duration(usage.seconds);
        writeln!(output, "{:<width$}  {duration:>7}", usage.domain).unwrap();
    }

    writeln!(output, "{}", "─".repeat(width + 9)).unwrap();
    let total = format_duration(data.total_seconds());
    writeln!(output, "{:<width$}  {total:>7}", "Total").unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub day: String,
    pub label: &'a str,
    pub total_seconds: u64,
    pub domains: Vec<JsonDomain<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonDomain<'a> {
    pub domain: &'a str,
    pub seconds: u64,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        day: data.day.format("%Y-%m-%d").to_string(),
        label: &data.label,
        total_seconds: data.total_seconds(),
        domains: data
            .domains
            .iter()
            .map(|usage| JsonDomain {
                domain: &usage.domain,
                seconds: usage.seconds,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(db: &Database, selection: DaySelection, json: bool) -> Result<()> {
    let today = Utc::now().date_naive();
    let data = generate_report_data(db, selection, today)?;

    if json {
        let output = format_report_json(&data)?;
        println!("{output}");
    } else {
        let output = format_report(&data);
        print!("{output}");
    }

    Ok(())
}
