//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{Datelike, Days, Months, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

/// Per-domain browsing time tracker.
///
/// Attributes wall-clock time to the domain of the focused browser tab and keeps
/// per-day totals.
#[derive(Debug, Parser)]
#[command(name = "dwell", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track time from newline-delimited JSON events read on stdin.
    Run,

    /// Show tracked time for a day, week or month.
    Status {
        /// Day to show, or the day a range is anchored on (YYYY-MM-DD, defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Span of days to sum.
        #[arg(long, value_enum, default_value_t = Period::Day)]
        range: Period,

        /// Print every stored day as JSON instead.
        #[arg(long, conflicts_with = "range")]
        json: bool,
    },

    /// Delete all tracked time.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Span of days summed by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    /// The anchor day only.
    Day,
    /// The seven days ending on the anchor day.
    Week,
    /// The calendar month containing the anchor day.
    Month,
}

impl Period {
    /// Inclusive first and last day of the period around `anchor`.
    ///
    /// `None` only at the edges of the representable calendar.
    pub fn bounds(self, anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::Day => Some((anchor, anchor)),
            Self::Week => Some((anchor.checked_sub_days(Days::new(6))?, anchor)),
            Self::Month => {
                let first = anchor.checked_sub_days(Days::new(u64::from(anchor.day0())))?;
                let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
                Some((first, last))
            }
        }
    }
}
