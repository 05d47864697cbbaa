pub mod config;
pub mod crop_stage;
pub mod error;
pub mod file_input;
pub mod inputs;
pub mod processor;
pub mod report;
pub mod scheduler;
pub mod stage_cycle;
pub mod water_balance;

pub use config::RunConfig;
pub use crop_stage::CropStage;
pub use error::{IrrigationError, Result};
pub use inputs::{CropCalendar, EnvironmentalData, PeriodClimate};
pub use processor::{IrrigationProcessor, RunParameters, compute_requirements};
pub use scheduler::{StageSchedule, StageScheduler, StageWindow, Tolerances};
pub use water_balance::{SlotBalance, StageSlots, WaterBalance};
