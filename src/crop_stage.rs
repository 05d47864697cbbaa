use crate::error::{IrrigationError, Result};

/**
One development stage of a crop in an irrigation unit that is planted gradually.

The stage is drawn in an area-time diagram: area (0..1 of the unit) runs
vertically and time runs horizontally in period units, period `p` covering
the interval `[p - 1, p]`. The strip of area at height `a` enters the stage at
`onset + a * sp` and leaves it `duration` later, so the stage covers a
parallelogram whose slanted sides have slope `1 / sp`:

```text
    A --------- B ----------E ----------G
    |   .       |   .       |   .       |
    |       .   |       .   |       .   |
    D-----------C-----------F-----------H
```

Both fractions are obtained by cutting that parallelogram with the vertical
strip of one period. The cut is computed exactly, so the area fractions of a
stage always add up to 1 and its area-time fractions add up to `duration`.
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropStage {
    start_period: usize, // Period in which the stage begins (1-based)
    time_offset: f64,    // Part of the start period elapsed before the stage begins [-]
    duration: f64,       // Length of the stage as a part of one period [-]
    sp: f64,             // Spreading period [periods]
    eps: f64,            // Tolerance for comparisons at period boundaries
}

impl CropStage {
    pub fn new(
        start_period: usize,
        time_offset: f64,
        duration: f64,
        sp: f64,
        eps: f64,
    ) -> Result<Self> {
        // Offsets are sums of durations and may overshoot 1 by rounding
        if !(0.0..=1.0 + eps).contains(&time_offset) {
            return Err(IrrigationError::StageFractionOutOfRange {
                field: "time offset",
                value: time_offset,
            });
        }
        let time_offset = time_offset.min(1.0);
        if !(0.0..=1.0).contains(&duration) {
            return Err(IrrigationError::StageFractionOutOfRange {
                field: "duration",
                value: duration,
            });
        }
        if !(sp.is_finite() && sp > 0.0) {
            return Err(IrrigationError::InvalidSpreadingPeriod {
                spreading_period: sp,
            });
        }
        if time_offset + duration > 1.0 + eps {
            return Err(IrrigationError::StageOverrunsPeriod {
                time_offset,
                duration,
            });
        }

        Ok(CropStage {
            start_period,
            time_offset,
            duration,
            sp,
            eps,
        })
    }

    pub fn start_period(&self) -> usize {
        self.start_period
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Last period in which part of the area still enters this stage.
    pub fn last_entry_period(&self) -> usize {
        self.last_period_reached(self.sp)
    }

    /// Last period in which part of the area is still in this stage.
    pub fn last_occupied_period(&self) -> usize {
        self.last_period_reached(self.sp + self.duration)
    }

    /// Share of the total area that enters this stage during `period`.
    pub fn area_fraction(&self, period: usize) -> f64 {
        if period < self.start_period || period > self.last_entry_period() {
            return 0.0;
        }
        let p = period as f64;
        let onset = self.onset();
        self.entered(onset, p) - self.entered(onset, p - 1.0)
    }

    /// Share of the area x time of `period` that is spent in this stage.
    ///
    /// The result is the leading edge's accumulated area-time within the
    /// period minus that of the trailing edge, which lags `duration` behind.
    pub fn area_time_fraction(&self, period: usize) -> f64 {
        if self.duration == 0.0
            || period < self.start_period
            || period > self.last_occupied_period()
        {
            return 0.0;
        }
        let p = period as f64;
        let leading = self.onset();
        let trailing = leading + self.duration;
        let within = |edge: f64| self.accumulated(edge, p) - self.accumulated(edge, p - 1.0);
        (within(leading) - within(trailing)).max(0.0)
    }

    // Absolute time at which the first strip of area enters the stage
    fn onset(&self) -> f64 {
        self.start_period as f64 - 1.0 + self.time_offset
    }

    // Period that contains the moment `span` periods after the onset; a moment
    // that falls on a boundary belongs to the period it closes
    fn last_period_reached(&self, span: f64) -> usize {
        let last = (self.start_period as f64 + self.time_offset + span - self.eps).floor();
        if last <= self.start_period as f64 {
            self.start_period
        } else {
            last as usize
        }
    }

    // Share of the area past an edge that starts at `edge`, at time t
    fn entered(&self, edge: f64, t: f64) -> f64 {
        ((t - edge) / self.sp).clamp(0.0, 1.0)
    }

    // Integral of `entered` up to time t: a triangle while the area is still
    // spreading, a full-height rectangle afterwards
    fn accumulated(&self, edge: f64, t: f64) -> f64 {
        let x = t - edge;
        if x <= 0.0 {
            0.0
        } else if x <= self.sp {
            0.5 * x * x / self.sp
        } else {
            0.5 * self.sp + (x - self.sp)
        }
    }
}
