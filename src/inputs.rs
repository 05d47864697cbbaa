use nalgebra::DVector;

// Environmental conditions of one accounting period
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodClimate {
    pub et0: f64,                // Reference evapotranspiration [mm/period]
    pub effective_rainfall: f64, // Effective rainfall [mm/period]
    pub percolation: f64,        // Percolation requirement [mm/period]
}

// Environmental input data, one row per accounting period
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentalData {
    pub et0: DVector<f64>,
    pub effective_rainfall: DVector<f64>,
    pub percolation: DVector<f64>,
}

impl EnvironmentalData {
    // Rows are (ET0, effective rainfall, percolation requirement)
    pub fn from_rows(rows: &[[f64; 3]]) -> Self {
        EnvironmentalData {
            et0: DVector::from_iterator(rows.len(), rows.iter().map(|r| r[0])),
            effective_rainfall: DVector::from_iterator(rows.len(), rows.iter().map(|r| r[1])),
            percolation: DVector::from_iterator(rows.len(), rows.iter().map(|r| r[2])),
        }
    }

    // Number of accounting periods (umax)
    pub fn periods(&self) -> usize {
        self.et0.len()
    }

    // Conditions for a 1-based period, None outside the table
    pub fn period(&self, period: usize) -> Option<PeriodClimate> {
        let i = period.checked_sub(1)?;
        if i >= self.periods() {
            return None;
        }
        Some(PeriodClimate {
            et0: self.et0[i],
            effective_rainfall: self.effective_rainfall[i],
            percolation: self.percolation[i],
        })
    }

    pub(crate) fn columns(&self) -> [(&'static str, &DVector<f64>); 3] {
        [
            ("ET0", &self.et0),
            ("effective rainfall", &self.effective_rainfall),
            ("percolation requirement", &self.percolation),
        ]
    }
}

// Crop calendar, one row per crop stage; stages are ordered by start period
#[derive(Clone, Debug, PartialEq)]
pub struct CropCalendar {
    pub duration: DVector<f64>,            // Stage length as a part of one period [-]
    pub crop_coefficient: DVector<f64>,    // Kc [-]
    pub special_requirement: DVector<f64>, // E.g. land preparation water [mm]
    pub depletion: DVector<f64>,           // Stored water used up during the stage [mm]
}

impl CropCalendar {
    // Rows are (duration, crop coefficient, special requirement, depletion)
    pub fn from_rows(rows: &[[f64; 4]]) -> Self {
        let column = |c: usize| DVector::from_iterator(rows.len(), rows.iter().map(|r| r[c]));
        CropCalendar {
            duration: column(0),
            crop_coefficient: column(1),
            special_requirement: column(2),
            depletion: column(3),
        }
    }

    // Number of stages (vmax)
    pub fn stages(&self) -> usize {
        self.duration.len()
    }

    // Rate at which stored water is drawn during a stage [mm/period]; a stage
    // without duration has no rate
    pub fn depletion_rate(&self, stage: usize) -> f64 {
        let duration = self.duration[stage];
        if duration > 0.0 {
            self.depletion[stage] / duration
        } else {
            0.0
        }
    }

    pub(crate) fn columns(&self) -> [(&'static str, &DVector<f64>); 4] {
        [
            ("duration", &self.duration),
            ("crop coefficient", &self.crop_coefficient),
            ("special requirement", &self.special_requirement),
            ("depletion", &self.depletion),
        ]
    }
}
