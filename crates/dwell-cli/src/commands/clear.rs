//! Clear command for deleting all tracked time.

use std::io::Write;

use anyhow::Result;

use dwell_db::Database;

/// Deletes every stored duration once confirmed.
pub fn run<W: Write>(writer: &mut W, db: &Database, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!("refusing to delete all tracked time without --yes");
    }
    let deleted = db.clear()?;
    writeln!(writer, "Deleted {deleted} entries.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use dwell_core::DateZone;

    #[test]
    fn clear_requires_confirmation() {
        let db = Database::open_in_memory().unwrap().with_zone(DateZone::utc());
        db.accumulate("a.com", 1_000, 0).unwrap();

        let mut output = Vec::new();
        let err = run(&mut output, &db, false).unwrap_err();
        assert!(err.to_string().contains("--yes"));
        assert_eq!(db.daily_totals().unwrap().len(), 1);
    }

    #[test]
    fn clear_reports_deleted_rows() {
        let db = Database::open_in_memory().unwrap().with_zone(DateZone::utc());
        db.accumulate("a.com", 1_000, 0).unwrap();
        db.accumulate("b.com", 1_000, 0).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, true).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Deleted 2 entries.\n");
        assert!(db.daily_totals().unwrap().is_empty());
    }
}
