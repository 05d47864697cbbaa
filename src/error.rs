//! Error types for the irrigation_demand crate.

use std::path::PathBuf;

/// Error type for every fallible operation in the crate.
///
/// All variants are fatal for a run: validation happens before any period
/// is evaluated and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum IrrigationError {
    /// Returned when the spreading period is zero, negative or not finite.
    #[error("spreading period must be finite and positive, got {spreading_period}")]
    InvalidSpreadingPeriod {
        /// The invalid spreading period.
        spreading_period: f64,
    },

    /// Returned when the spreading period is longer than the whole calendar.
    #[error("spreading period {spreading_period} exceeds the number of periods {periods}")]
    SpreadingPeriodTooLong {
        /// The requested spreading period.
        spreading_period: f64,
        /// Number of accounting periods.
        periods: usize,
    },

    /// Returned when the number of stages is not a multiple of the number of periods.
    #[error("{stages} crop stages cannot be divided evenly over {periods} periods")]
    StageCountMismatch {
        /// Number of crop-calendar rows.
        stages: usize,
        /// Number of environmental rows.
        periods: usize,
    },

    /// Returned when a stage schedule is paired with tables it was not built for.
    #[error("schedule was built for {scheduled} rows of the {table} table, got {rows}")]
    ScheduleMismatch {
        /// Name of the table.
        table: &'static str,
        /// Rows the schedule was built for.
        scheduled: usize,
        /// Rows the table has.
        rows: usize,
    },

    /// Returned when an input table has no rows.
    #[error("{table} table is empty")]
    EmptyTable {
        /// Name of the table.
        table: &'static str,
    },

    /// Returned when a table value is negative or not finite.
    #[error("{column} in row {row} of the {table} table must be >= 0, got {value}")]
    NegativeValue {
        /// Name of the table.
        table: &'static str,
        /// Name of the column.
        column: &'static str,
        /// 1-based row number.
        row: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when the stage durations of one period do not add up to about 1.
    #[error("stage durations in period {period} sum to {sum}, more than {tolerance} away from 1.0")]
    DurationSumOutOfTolerance {
        /// 1-based period number.
        period: usize,
        /// Sum of the durations of the stages starting in that period.
        sum: f64,
        /// Allowed deviation from 1.0.
        tolerance: f64,
    },

    /// Returned when a stage offset or duration lies outside [0, 1].
    #[error("stage {field} must lie within [0, 1], got {value}")]
    StageFractionOutOfRange {
        /// Either "time offset" or "duration".
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Returned when a stage would run past the end of its starting period.
    #[error("stage time offset {time_offset} plus duration {duration} exceeds 1.0")]
    StageOverrunsPeriod {
        /// Fraction of the period elapsed before the stage begins.
        time_offset: f64,
        /// Fraction of the period taken by the stage.
        duration: f64,
    },

    /// Returned when the irrigation efficiency is outside (0, 1].
    #[error("irrigation efficiency must lie within (0, 1], got {efficiency}")]
    InvalidEfficiency {
        /// The invalid efficiency.
        efficiency: f64,
    },

    /// Returned when the first requested period comes after the last one.
    #[error("first period {first} comes after last period {last}")]
    ReversedPeriodRange {
        /// First requested period.
        first: usize,
        /// Last requested period.
        last: usize,
    },

    /// Returned when a requested period is not covered by the environmental table.
    #[error("period {period} is outside 1..={periods}")]
    PeriodOutOfRange {
        /// The requested period.
        period: usize,
        /// Number of accounting periods.
        periods: usize,
    },

    /// Internal invariant: the stages of one window claim more than the whole period.
    #[error("area-time fractions in period {period} sum to {sum}, which exceeds 1.0")]
    AreaTimeOverCommitted {
        /// 1-based period number.
        period: usize,
        /// Sum of the window's area-time fractions.
        sum: f64,
    },

    /// Returned when an input file cannot be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a table file contains a malformed line.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Returned when the run configuration is not valid TOML or misses keys.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, IrrigationError>;
