//! Storage layer for the browsing time meter.
//!
//! Persists per-day, per-domain accumulated seconds using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! One row per `(day, domain)` pair. `day` is a `YYYY-MM-DD` key for the UTC
//! calendar day; `seconds` is the accumulated whole seconds. Writes from the
//! tracker are additive upserts, so each flush only has to carry its own
//! delta and concurrent or reordered flushes sum correctly.

use std::collections::BTreeMap;
use std::path::Path;

use meter_core::{Flush, UsageSink, parse_day_key};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A day key was not a `YYYY-MM-DD` calendar date.
    #[error("invalid day key: {0}")]
    InvalidDay(String),
    /// A seconds value did not fit the storage type.
    #[error("seconds out of range for {domain} on {day}: {seconds}")]
    SecondsOutOfRange {
        day: String,
        domain: String,
        seconds: i128,
    },
}

/// Accumulated time for each domain, keyed by day.
pub type DayUsage = BTreeMap<String, BTreeMap<String, u64>>;

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Accumulated time for one domain on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainUsage {
    pub domain: String,
    pub seconds: u64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- day: UTC calendar date (e.g., '2024-01-15')
            -- seconds: accumulated whole seconds of attention
            CREATE TABLE IF NOT EXISTS usage (
                day TEXT NOT NULL,
                domain TEXT NOT NULL,
                seconds INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (day, domain)
            );

            CREATE INDEX IF NOT EXISTS idx_usage_day ON usage(day);
            ",
        )?;
        Ok(())
    }

    /// Adds `seconds` to the running total for `domain` on `day`.
    pub fn add_seconds(&mut self, day: &str, domain: &str, seconds: u64) -> Result<(), DbError> {
        validate_day(day)?;
        let seconds = to_sql_seconds(day, domain, seconds)?;
        self.conn.execute(
            "
            INSERT INTO usage (day, domain, seconds) VALUES (?1, ?2, ?3)
            ON CONFLICT(day, domain) DO UPDATE SET seconds = seconds + excluded.seconds
            ",
            params![day, domain, seconds],
        )?;
        Ok(())
    }

    /// Domain totals for one day, most time first.
    pub fn day_usage(&self, day: &str) -> Result<Vec<DomainUsage>, DbError> {
        validate_day(day)?;
        let mut stmt = self.conn.prepare(
            "
            SELECT domain, seconds FROM usage
            WHERE day = ?1 AND seconds > 0
            ORDER BY seconds DESC, domain ASC
            ",
        )?;
        let rows = stmt.query_map([day], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut usage = Vec::new();
        for row in rows {
            let (domain, seconds) = row?;
            usage.push(DomainUsage {
                seconds: from_sql_seconds(day, &domain, seconds)?,
                domain,
            });
        }
        Ok(usage)
    }

    /// Total seconds tracked on one day.
    pub fn day_total(&self, day: &str) -> Result<u64, DbError> {
        validate_day(day)?;
        let total: Option<i64> = self
            .conn
            .query_row(
                "SELECT SUM(seconds) FROM usage WHERE day = ?1",
                [day],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        total.map_or(Ok(0), |seconds| from_sql_seconds(day, "*", seconds))
    }

    /// Every day with recorded data, oldest first.
    pub fn list_days(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT day FROM usage ORDER BY day ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// All recorded data, keyed by day then domain.
    pub fn export_all(&self) -> Result<DayUsage, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT day, domain, seconds FROM usage ORDER BY day ASC, domain ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut days = DayUsage::new();
        for row in rows {
            let (day, domain, seconds) = row?;
            let seconds = from_sql_seconds(&day, &domain, seconds)?;
            days.entry(day).or_default().insert(domain, seconds);
        }
        Ok(days)
    }

    /// Replaces each imported day wholesale; days not in `days` are untouched.
    ///
    /// Either every day is imported or none is. Returns the number of days.
    pub fn import_days(&mut self, days: &DayUsage) -> Result<usize, DbError> {
        for day in days.keys() {
            validate_day(day)?;
        }

        let tx = self.conn.transaction()?;
        {
            let mut delete = tx.prepare("DELETE FROM usage WHERE day = ?1")?;
            let mut insert =
                tx.prepare("INSERT INTO usage (day, domain, seconds) VALUES (?1, ?2, ?3)")?;
            for (day, domains) in days {
                delete.execute([day])?;
                for (domain, seconds) in domains {
                    let seconds = to_sql_seconds(day, domain, *seconds)?;
                    insert.execute(params![day, domain, seconds])?;
                }
            }
        }
        tx.commit()?;
        tracing::debug!(days = days.len(), "imported usage");
        Ok(days.len())
    }

    /// Removes every recorded day. Returns how many days were removed.
    pub fn reset(&mut self) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let days: i64 = tx.query_row("SELECT COUNT(DISTINCT day) FROM usage", [], |row| {
            row.get(0)
        })?;
        tx.execute("DELETE FROM usage", [])?;
        tx.commit()?;
        Ok(usize::try_from(days).unwrap_or(0))
    }
}

impl UsageSink for Database {
    type Error = DbError;

    fn record(&mut self, flush: &Flush) -> Result<(), Self::Error> {
        self.add_seconds(&flush.day, flush.domain.as_str(), flush.seconds)
    }
}

fn validate_day(day: &str) -> Result<(), DbError> {
    parse_day_key(day)
        .map(|_| ())
        .ok_or_else(|| DbError::InvalidDay(day.to_string()))
}

fn to_sql_seconds(day: &str, domain: &str, seconds: u64) -> Result<i64, DbError> {
    i64::try_from(seconds).map_err(|_| DbError::SecondsOutOfRange {
        day: day.to_string(),
        domain: domain.to_string(),
        seconds: i128::from(seconds),
    })
}

fn from_sql_seconds(day: &str, domain: &str, seconds: i64) -> Result<u64, DbError> {
    u64::try_from(seconds).map_err(|_| DbError::SecondsOutOfRange {
        day: day.to_string(),
        domain: domain.to_string(),
        seconds: i128::from(seconds),
    })
}
