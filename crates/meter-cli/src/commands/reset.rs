//! Reset command: delete every tracked day.

use anyhow::Result;

use meter_db::Database;

/// Deletes all tracked days when `confirmed`. Returns the number removed.
pub fn run(db: &mut Database, confirmed: bool) -> Result<usize> {
    if !confirmed {
        anyhow::bail!("refusing to delete tracked data without --yes");
    }

    let removed = db.reset()?;
    if removed == 0 {
        eprintln!("No tracked data to reset.");
    } else {
        eprintln!("Deleted {removed} tracked day(s).");
    }
    Ok(removed)
}
