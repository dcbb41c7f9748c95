//! Status command for showing tracked time per domain.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use dwell_db::Database;

use super::util::format_duration_ms;

/// Prints per-domain totals summed over `start..=end`, largest first.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    db_path: &Path,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let totals = db.totals_between(start, end)?;

    writeln!(writer, "Database: {}", db_path.display())?;
    if start == end {
        writeln!(writer, "Date: {start}")?;
    } else {
        writeln!(writer, "Dates: {start} to {end}")?;
    }

    if totals.is_empty() {
        writeln!(writer, "No time tracked.")?;
        return Ok(());
    }

    let width = totals
        .iter()
        .map(|total| total.domain.len())
        .max()
        .unwrap_or(0)
        .max("Total".len());
    for total in &totals {
        writeln!(
            writer,
            "{:<width$}  {}",
            total.domain,
            format_duration_ms(total.ms)
        )?;
    }
    let sum: i64 = totals.iter().map(|total| total.ms).sum();
    writeln!(writer, "{:<width$}  {}", "Total", format_duration_ms(sum))?;

    Ok(())
}

/// Prints every stored day as `{"YYYY-MM-DD": {"domain": ms}}`.
pub fn run_json<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let totals = db.daily_totals()?;
    serde_json::to_writer_pretty(&mut *writer, &totals)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use dwell_core::DateZone;
    use insta::assert_snapshot;

    // 2025-01-15T10:00:00Z
    const MORNING: i64 = 1_736_935_200_000;

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap().with_zone(DateZone::utc());
        db.accumulate("example.com", 3_600_000, MORNING).unwrap();
        db.accumulate("example.com", 123_000, MORNING + 60_000)
            .unwrap();
        db.accumulate("rust-lang.org", 61_000, MORNING).unwrap();
        db.accumulate("docs.rs", 5_000, MORNING + 24 * 3_600_000)
            .unwrap();
        db
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn status_lists_domains_for_day() {
        let db = seeded_db();
        let mut output = Vec::new();
        let date = day("2025-01-15");
        run(&mut output, &db, Path::new("/data/dwell.db"), date, date).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
Database: /data/dwell.db
Date: 2025-01-15
example.com    1h 2m 3s
rust-lang.org  1m 1s
Total          1h 3m 4s
");
    }

    #[test]
    fn status_reports_empty_day() {
        let db = seeded_db();
        let mut output = Vec::new();
        let date = day("2024-12-31");
        run(&mut output, &db, Path::new("/data/dwell.db"), date, date).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.ends_with("No time tracked.\n"));
    }

    #[test]
    fn status_sums_range_of_days() {
        let db = seeded_db();
        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            Path::new("/data/dwell.db"),
            day("2025-01-10"),
            day("2025-01-16"),
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
Database: /data/dwell.db
Dates: 2025-01-10 to 2025-01-16
example.com    1h 2m 3s
rust-lang.org  1m 1s
docs.rs        5s
Total          1h 3m 9s
");
    }

    #[test]
    fn status_rejects_inverted_range() {
        let db = seeded_db();
        let mut output = Vec::new();
        let result = run(
            &mut output,
            &db,
            Path::new("/data/dwell.db"),
            day("2025-01-16"),
            day("2025-01-10"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn status_json_prints_persisted_layout() {
        let db = seeded_db();
        let mut output = Vec::new();
        run_json(&mut output, &db).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "2025-01-15": {"example.com": 3_723_000, "rust-lang.org": 61_000},
                "2025-01-16": {"docs.rs": 5_000},
            })
        );
    }
}
