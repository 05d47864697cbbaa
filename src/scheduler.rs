use approx::abs_diff_eq;
use serde::Deserialize;
use tracing::{debug, info};

use crate::crop_stage::CropStage;
use crate::error::{IrrigationError, Result};
use crate::inputs::CropCalendar;
use crate::stage_cycle::{CycleIndex, StageCycle};

/// Numerical tolerances shared by the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Tolerances {
    /// Slack for comparisons at exact period boundaries.
    pub epsilon: f64,
    /// Allowed deviation from 1.0 of the summed stage durations of a period.
    pub duration_sum: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            epsilon: 1e-7,
            duration_sum: 0.02,
        }
    }
}

/// The stages that can be active in one period.
///
/// A stage that starts `lookback` periods before the current one may still
/// be occupying land in it, so the window holds the stages of the current
/// period and of the `lookback` periods before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageWindow {
    /// Periods to look back (L).
    pub lookback: usize,
    /// Stages starting in each period (N).
    pub stages_per_period: usize,
    /// Stages that can coincide with one period (M).
    pub slots: usize,
}

impl StageWindow {
    pub fn new(spreading_period: f64, stages_per_period: usize, eps: f64) -> Self {
        let lookback = (spreading_period - eps).floor().max(0.0) as usize + 1;
        StageWindow {
            lookback,
            stages_per_period,
            slots: (lookback + 1) * stages_per_period,
        }
    }

    /// Raw stage index of `slot` in the window of a 1-based `period`; negative
    /// before the first stage of the calendar.
    pub fn raw_index(&self, period: usize, slot: usize) -> isize {
        (period as isize - self.lookback as isize - 1) * self.stages_per_period as isize
            + slot as isize
    }
}

/// Builds the crop stages from a crop calendar.
#[derive(Clone, Copy, Debug)]
pub struct StageScheduler {
    spreading_period: f64,
    tolerances: Tolerances,
}

/// Validated crop stages together with the window that selects them.
#[derive(Clone, Debug)]
pub struct StageSchedule {
    stages: Vec<CropStage>,
    window: StageWindow,
    cycle: StageCycle,
    periods: usize,
}

impl StageScheduler {
    pub fn new(spreading_period: f64, tolerances: Tolerances) -> Self {
        StageScheduler {
            spreading_period,
            tolerances,
        }
    }

    /// Validates the calendar against `periods` accounting periods and lays
    /// out one `CropStage` per row.
    pub fn schedule(&self, calendar: &CropCalendar, periods: usize) -> Result<StageSchedule> {
        let sp = self.spreading_period;
        let eps = self.tolerances.epsilon;
        let stages_per_period = self.validate(calendar, periods)?;

        let mut stages = Vec::with_capacity(calendar.stages());
        for v in 0..calendar.stages() {
            let first_of_period = v - v % stages_per_period;
            let time_offset: f64 = calendar
                .duration
                .iter()
                .skip(first_of_period)
                .take(v - first_of_period)
                .sum();
            let start_period = v / stages_per_period + 1;
            stages.push(CropStage::new(
                start_period,
                time_offset,
                calendar.duration[v],
                sp,
                eps,
            )?);
        }

        let window = StageWindow::new(sp, stages_per_period, eps);
        info!(
            periods,
            stages = stages.len(),
            spreading_period = sp,
            lookback = window.lookback,
            slots = window.slots,
            "crop stages scheduled"
        );

        Ok(StageSchedule {
            stages,
            window,
            cycle: StageCycle::new(calendar.stages()),
            periods,
        })
    }

    // Returns the number of stages per period
    fn validate(&self, calendar: &CropCalendar, periods: usize) -> Result<usize> {
        let sp = self.spreading_period;
        if !(sp.is_finite() && sp > 0.0) {
            return Err(IrrigationError::InvalidSpreadingPeriod {
                spreading_period: sp,
            });
        }
        if periods == 0 {
            return Err(IrrigationError::EmptyTable {
                table: "environmental",
            });
        }
        if calendar.stages() == 0 {
            return Err(IrrigationError::EmptyTable {
                table: "crop calendar",
            });
        }
        if sp > periods as f64 {
            return Err(IrrigationError::SpreadingPeriodTooLong {
                spreading_period: sp,
                periods,
            });
        }
        if calendar.stages() % periods != 0 {
            return Err(IrrigationError::StageCountMismatch {
                stages: calendar.stages(),
                periods,
            });
        }

        for (column, values) in calendar.columns() {
            if let Some((row, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, x)| !(x.is_finite() && **x >= 0.0))
            {
                return Err(IrrigationError::NegativeValue {
                    table: "crop calendar",
                    column,
                    row: row + 1,
                    value,
                });
            }
        }

        let n = calendar.stages() / periods;
        let tolerance = self.tolerances.duration_sum;
        for u in 0..periods {
            let sum = calendar.duration.rows(u * n, n).sum();
            if !abs_diff_eq!(sum, 1.0, epsilon = tolerance) {
                return Err(IrrigationError::DurationSumOutOfTolerance {
                    period: u + 1,
                    sum,
                    tolerance,
                });
            }
        }
        debug!(stages_per_period = n, "crop calendar validated");
        Ok(n)
    }
}

impl StageSchedule {
    pub fn stages(&self) -> &[CropStage] {
        &self.stages
    }

    pub fn window(&self) -> StageWindow {
        self.window
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Resolves `slot` of the window of `period`, wrapping into earlier
    /// cycles of the calendar before its first stage.
    pub fn slot(&self, period: usize, slot: usize) -> Option<CycleIndex> {
        self.cycle.resolve(self.window.raw_index(period, slot))
    }
}
