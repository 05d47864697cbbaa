// Periodic index space over the crop calendar. The calendar repeats every
// `len` stages, so a raw index before the first stage refers to a stage of
// an earlier cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageCycle {
    len: usize, // Number of stages in one cycle
}

// A raw index resolved into the stage it refers to and the cycle it lies in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleIndex {
    pub stage: usize, // 0-based index into the crop calendar
    pub cycle: isize, // 0 for the current cycle, -1 for the one before, ...
}

impl StageCycle {
    pub fn new(len: usize) -> Self {
        StageCycle { len }
    }

    /// Wraps a raw (possibly negative) stage index into the calendar.
    ///
    /// Returns `None` for an empty calendar.
    pub fn resolve(&self, raw: isize) -> Option<CycleIndex> {
        if self.len == 0 {
            return None;
        }
        let len = self.len as isize;
        Some(CycleIndex {
            stage: raw.rem_euclid(len) as usize,
            cycle: raw.div_euclid(len),
        })
    }
}

impl CycleIndex {
    /// Expresses `period` of the current cycle in the period numbering of
    /// the cycle this stage belongs to.
    ///
    /// A stage from the previous cycle sees period 1 of the current cycle as
    /// period `periods + 1`. Returns `None` when the shifted period would lie
    /// before the first period.
    pub fn period_in_own_cycle(&self, period: usize, periods: usize) -> Option<usize> {
        let shifted = period as isize - self.cycle * periods as isize;
        usize::try_from(shifted).ok().filter(|p| *p >= 1)
    }
}
