use nalgebra::DVector;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{IrrigationError, Result};
use crate::inputs::{CropCalendar, EnvironmentalData};
use crate::scheduler::{StageSchedule, StageScheduler, Tolerances};
use crate::water_balance::{StageSlots, WaterBalance};

/// Scalar parameters of one run.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunParameters {
    /// First period to compute (1-based).
    pub first_period: usize,
    /// Last period to compute (1-based, inclusive).
    pub last_period: usize,
    /// Periods needed to plant the whole scheme.
    pub spreading_period: f64,
    /// Overall irrigation efficiency (0, 1].
    pub efficiency: f64,
}

// Walks the requested periods and evaluates the water balance of each one
pub struct IrrigationProcessor<'a> {
    schedule: &'a StageSchedule,
    calendar: &'a CropCalendar,
    environment: &'a EnvironmentalData,
    balance: WaterBalance,
}

impl<'a> IrrigationProcessor<'a> {
    pub fn new(
        schedule: &'a StageSchedule,
        calendar: &'a CropCalendar,
        environment: &'a EnvironmentalData,
        balance: WaterBalance,
    ) -> Result<Self> {
        if schedule.periods() != environment.periods() {
            return Err(IrrigationError::ScheduleMismatch {
                table: "environmental",
                scheduled: schedule.periods(),
                rows: environment.periods(),
            });
        }
        if schedule.stages().len() != calendar.stages() {
            return Err(IrrigationError::ScheduleMismatch {
                table: "crop calendar",
                scheduled: schedule.stages().len(),
                rows: calendar.stages(),
            });
        }
        for (column, values) in environment.columns() {
            if let Some((row, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, x)| !(x.is_finite() && **x >= 0.0))
            {
                return Err(IrrigationError::NegativeValue {
                    table: "environmental",
                    column,
                    row: row + 1,
                    value,
                });
            }
        }

        Ok(IrrigationProcessor {
            schedule,
            calendar,
            environment,
            balance,
        })
    }

    /// Crop data and fractions of every stage in the window of `period`.
    ///
    /// Stages reached by wrapping past the start of the calendar belong to
    /// the previous cycle and are asked about `period` as seen from there.
    pub fn stage_slots(&self, period: usize) -> StageSlots {
        let window = self.schedule.window();
        let periods = self.schedule.periods();
        let mut slots = StageSlots::zeros(window.slots);

        for k in 0..window.slots {
            let Some(index) = self.schedule.slot(period, k) else {
                continue;
            };
            let v = index.stage;
            slots.crop_coefficient[k] = self.calendar.crop_coefficient[v];
            slots.special_requirement[k] = self.calendar.special_requirement[v];
            slots.depletion_rate[k] = self.calendar.depletion_rate(v);

            if let Some(own) = index.period_in_own_cycle(period, periods) {
                let stage = &self.schedule.stages()[v];
                slots.area_fraction[k] = stage.area_fraction(own);
                slots.area_time_fraction[k] = stage.area_time_fraction(own);
            }
        }
        slots
    }

    /// Gross irrigation requirement of one period, not rounded.
    pub fn period_requirement(&self, period: usize) -> Result<f64> {
        let climate = self
            .environment
            .period(period)
            .ok_or(IrrigationError::PeriodOutOfRange {
                period,
                periods: self.environment.periods(),
            })?;
        let slots = self.stage_slots(period);
        self.balance.gross_requirement(period, &climate, &slots)
    }

    /// Requirements for periods `first..=last`, rounded to 3 decimals. The
    /// result holds one value per period of the calendar; periods outside
    /// the requested range stay at zero.
    pub fn run(&self, first: usize, last: usize) -> Result<DVector<f64>> {
        let periods = self.environment.periods();
        if first > last {
            return Err(IrrigationError::ReversedPeriodRange { first, last });
        }
        for period in [first, last] {
            if period == 0 || period > periods {
                return Err(IrrigationError::PeriodOutOfRange { period, periods });
            }
        }

        let mut result = DVector::zeros(periods);
        for u in first..=last {
            let requirement = round3(self.period_requirement(u)?);
            debug!(period = u, requirement, "period evaluated");
            result[u - 1] = requirement;
        }
        info!(first, last, total = result.sum(), "irrigation requirements computed");
        Ok(result)
    }
}

// Round to 3 decimals
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Validates the inputs, schedules the crop stages and computes the gross
/// irrigation requirement of every requested period.
pub fn compute_requirements(
    params: &RunParameters,
    tolerances: Tolerances,
    environment: &EnvironmentalData,
    calendar: &CropCalendar,
) -> Result<DVector<f64>> {
    if params.first_period > params.last_period {
        return Err(IrrigationError::ReversedPeriodRange {
            first: params.first_period,
            last: params.last_period,
        });
    }
    let balance = WaterBalance::new(params.efficiency, tolerances.epsilon)?;
    let schedule = StageScheduler::new(params.spreading_period, tolerances)
        .schedule(calendar, environment.periods())?;
    let processor = IrrigationProcessor::new(&schedule, calendar, environment, balance)?;
    processor.run(params.first_period, params.last_period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params(first: usize, last: usize, sp: f64, efficiency: f64) -> RunParameters {
        RunParameters {
            first_period: first,
            last_period: last,
            spreading_period: sp,
            efficiency,
        }
    }

    fn dry_year(et0: f64) -> EnvironmentalData {
        EnvironmentalData::from_rows(&[[et0, 0.0, 0.0]; 12])
    }

    fn uniform_calendar(durations: &[f64], kc: f64) -> CropCalendar {
        let rows: Vec<[f64; 4]> = (0..12)
            .flat_map(|_| durations.iter().map(move |d| [*d, kc, 0.0, 0.0]))
            .collect();
        CropCalendar::from_rows(&rows)
    }

    #[test]
    fn window_covers_each_period_exactly_once() {
        let calendar = uniform_calendar(&[0.25, 0.5, 0.25], 1.0);
        let env = dry_year(100.0);
        let tolerances = Tolerances::default();
        for x in 1..=24 {
            let sp = x as f64 / 4.0;
            let schedule = StageScheduler::new(sp, tolerances)
                .schedule(&calendar, 12)
                .unwrap();
            let balance = WaterBalance::new(1.0, tolerances.epsilon).unwrap();
            let processor = IrrigationProcessor::new(&schedule, &calendar, &env, balance).unwrap();
            for u in 1..=12 {
                let covered = processor.stage_slots(u).area_time_fraction.sum();
                assert_abs_diff_eq!(covered, 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn steady_crop_needs_et0_over_efficiency() {
        let result = compute_requirements(
            &params(1, 12, 1.5, 0.8),
            Tolerances::default(),
            &dry_year(100.0),
            &uniform_calendar(&[1.0], 1.0),
        )
        .unwrap();
        for u in 0..12 {
            assert_abs_diff_eq!(result[u], 125.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn previous_year_stages_reach_into_january() {
        let mut rows = vec![[1.0, 1.0, 0.0, 0.0]; 12];
        rows[11][1] = 0.0; // fallow-like last stage
        let result = compute_requirements(
            &params(1, 12, 1.0, 1.0),
            Tolerances::default(),
            &dry_year(100.0),
            &CropCalendar::from_rows(&rows),
        )
        .unwrap();
        assert_abs_diff_eq!(result[0], 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result[1], 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result[11], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn special_requirement_follows_area_entering_the_stage() {
        let mut rows = vec![[1.0, 0.0, 0.0, 0.0]; 12];
        rows[2][2] = 80.0; // land preparation in March
        let result = compute_requirements(
            &params(1, 12, 2.0, 1.0),
            Tolerances::default(),
            &dry_year(100.0),
            &CropCalendar::from_rows(&rows),
        )
        .unwrap();
        assert_eq!(result[1], 0.0);
        assert_abs_diff_eq!(result[2], 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result[3], 40.0, epsilon = 1e-9);
        assert_eq!(result[4], 0.0);
    }

    #[test]
    fn rainfall_and_stored_water_cover_demand() {
        let env = EnvironmentalData::from_rows(&[[100.0, 60.0, 0.0]; 12]);
        let calendar = CropCalendar::from_rows(&[[1.0, 1.0, 0.0, 40.0]; 12]);
        let result =
            compute_requirements(&params(1, 12, 1.0, 0.5), Tolerances::default(), &env, &calendar)
                .unwrap();
        assert!(result.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn periods_outside_the_range_stay_zero() {
        let result = compute_requirements(
            &params(4, 6, 1.0, 0.65),
            Tolerances::default(),
            &dry_year(5.0),
            &uniform_calendar(&[1.0], 1.0),
        )
        .unwrap();
        assert_eq!(result.len(), 12);
        assert_eq!(result[2], 0.0);
        assert_eq!(result[3], 7.692);
        assert_eq!(result[5], 7.692);
        assert_eq!(result[6], 0.0);
    }

    #[test]
    fn reversed_range_fails_before_anything_else() {
        // The calendar is malformed too; the range is reported first
        let result = compute_requirements(
            &params(7, 3, 1.0, 0.65),
            Tolerances::default(),
            &dry_year(5.0),
            &CropCalendar::from_rows(&[[1.0, 1.0, 0.0, 0.0]; 5]),
        );
        assert!(matches!(
            result,
            Err(IrrigationError::ReversedPeriodRange { first: 7, last: 3 })
        ));
    }

    #[test]
    fn uneven_calendar_is_rejected() {
        let result = compute_requirements(
            &params(1, 12, 1.0, 0.65),
            Tolerances::default(),
            &dry_year(5.0),
            &CropCalendar::from_rows(&[[0.5, 1.0, 0.0, 0.0]; 25]),
        );
        assert!(matches!(
            result,
            Err(IrrigationError::StageCountMismatch { stages: 25, periods: 12 })
        ));
    }

    #[test]
    fn trailing_null_stage_is_scheduled() {
        let result = compute_requirements(
            &params(1, 12, 1.0, 1.0),
            Tolerances::default(),
            &dry_year(100.0),
            &uniform_calendar(&[0.2, 0.4, 0.3, 0.1, 0.0], 1.0),
        )
        .unwrap();
        for u in 0..12 {
            assert_abs_diff_eq!(result[u], 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn schedule_must_match_the_tables() {
        let calendar = uniform_calendar(&[0.5, 0.5], 1.0);
        let schedule = StageScheduler::new(1.0, Tolerances::default())
            .schedule(&calendar, 12)
            .unwrap();
        let balance = WaterBalance::new(1.0, 1e-7).unwrap();
        let half_year = EnvironmentalData::from_rows(&[[5.0, 0.0, 0.0]; 6]);
        let result = IrrigationProcessor::new(&schedule, &calendar, &half_year, balance);
        assert!(matches!(
            result,
            Err(IrrigationError::ScheduleMismatch {
                table: "environmental",
                scheduled: 12,
                rows: 6,
            })
        ));

        let other = uniform_calendar(&[1.0], 1.0);
        let dry = dry_year(5.0);
        let result = IrrigationProcessor::new(&schedule, &other, &dry, balance);
        assert!(matches!(
            result,
            Err(IrrigationError::ScheduleMismatch {
                table: "crop calendar",
                scheduled: 24,
                rows: 12,
            })
        ));
    }

    #[test]
    fn negative_climate_is_rejected() {
        let mut rows = [[5.0, 0.0, 0.0]; 12];
        rows[3][1] = -2.0;
        let result = compute_requirements(
            &params(1, 12, 1.0, 0.65),
            Tolerances::default(),
            &EnvironmentalData::from_rows(&rows),
            &uniform_calendar(&[1.0], 1.0),
        );
        assert!(matches!(
            result,
            Err(IrrigationError::NegativeValue {
                table: "environmental",
                column: "effective rainfall",
                row: 4,
                ..
            })
        ));
    }

    #[test]
    fn range_must_lie_within_the_calendar() {
        let result = compute_requirements(
            &params(0, 12, 1.0, 0.65),
            Tolerances::default(),
            &dry_year(5.0),
            &uniform_calendar(&[1.0], 1.0),
        );
        assert!(matches!(
            result,
            Err(IrrigationError::PeriodOutOfRange { period: 0, .. })
        ));
        let result = compute_requirements(
            &params(1, 13, 1.0, 0.65),
            Tolerances::default(),
            &dry_year(5.0),
            &uniform_calendar(&[1.0], 1.0),
        );
        assert!(matches!(
            result,
            Err(IrrigationError::PeriodOutOfRange { period: 13, .. })
        ));
    }
}
