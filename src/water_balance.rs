use nalgebra::DVector;
use tracing::trace;

use crate::error::{IrrigationError, Result};
use crate::inputs::PeriodClimate;

// Crop data and geometric fractions of the stages in one period's window,
// one entry per window slot
#[derive(Clone, Debug, PartialEq)]
pub struct StageSlots {
    pub crop_coefficient: DVector<f64>,    // Kc [-]
    pub special_requirement: DVector<f64>, // [mm]
    pub depletion_rate: DVector<f64>,      // Stored water drawn [mm/period]
    pub area_fraction: DVector<f64>,       // Area entering the stage [-]
    pub area_time_fraction: DVector<f64>,  // Area x time spent in the stage [-]
}

impl StageSlots {
    pub fn zeros(slots: usize) -> Self {
        StageSlots {
            crop_coefficient: DVector::zeros(slots),
            special_requirement: DVector::zeros(slots),
            depletion_rate: DVector::zeros(slots),
            area_fraction: DVector::zeros(slots),
            area_time_fraction: DVector::zeros(slots),
        }
    }

    pub fn len(&self) -> usize {
        self.crop_coefficient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Water requirement and supply of a single window slot [mm/period]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotBalance {
    pub consumptive: f64,       // Kc * ET0
    pub ordinary: f64,          // Consumptive plus percolation when a crop is present
    pub special: f64,           // Special requirement for the area entering the stage
    pub natural_supply: f64,    // Effective rainfall plus depletion of stored water
    pub rainfall_deficit: f64,  // Shortfall of natural supply, weighted by area x time
    pub rainfall_surplus: f64,  // Excess of natural supply; not stored on the scheme
    pub irrigation: f64,        // Net irrigation requirement
}

/// Turns the stage fractions of a period into a gross irrigation requirement.
#[derive(Clone, Copy, Debug)]
pub struct WaterBalance {
    efficiency: f64, // Overall irrigation efficiency (0, 1]
    eps: f64,
}

impl WaterBalance {
    pub fn new(efficiency: f64, eps: f64) -> Result<Self> {
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(IrrigationError::InvalidEfficiency { efficiency });
        }
        Ok(WaterBalance { efficiency, eps })
    }

    pub fn slot_balance(
        &self,
        climate: &PeriodClimate,
        slots: &StageSlots,
        k: usize,
    ) -> SlotBalance {
        let kc = slots.crop_coefficient[k];
        let consumptive = kc * climate.et0;
        // Without a crop there is no percolation loss to make up for
        let ordinary = if kc > 0.0 {
            consumptive + climate.percolation
        } else {
            consumptive
        };
        let special = slots.area_fraction[k] * slots.special_requirement[k];
        let natural_supply = climate.effective_rainfall + slots.depletion_rate[k];
        let atf = slots.area_time_fraction[k];
        let rainfall_deficit = atf * (ordinary - natural_supply).max(0.0);
        let rainfall_surplus = atf * (natural_supply - ordinary).max(0.0);

        SlotBalance {
            consumptive,
            ordinary,
            special,
            natural_supply,
            rainfall_deficit,
            rainfall_surplus,
            irrigation: rainfall_deficit + special,
        }
    }

    /// Gross irrigation requirement of `period` [mm/period].
    ///
    /// The area-time fractions of one window can never cover more than the
    /// whole period; if they do the window was assembled wrongly and the run
    /// is aborted.
    pub fn gross_requirement(
        &self,
        period: usize,
        climate: &PeriodClimate,
        slots: &StageSlots,
    ) -> Result<f64> {
        let covered = slots.area_time_fraction.sum();
        if covered - 1.0 > self.eps {
            return Err(IrrigationError::AreaTimeOverCommitted {
                period,
                sum: covered,
            });
        }

        let mut net = 0.0;
        for k in 0..slots.len() {
            let slot = self.slot_balance(climate, slots, k);
            trace!(period, k, balance = ?slot, "slot balance");
            net += slot.irrigation;
        }
        Ok(net / self.efficiency)
    }
}
