pub mod attributor;
pub mod calculator;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod identifier;
pub mod index;
pub mod loader;
pub mod rounding;
pub mod writer;

pub use attributor::SpendAttributor;
pub use calculator::{Calculator, MissingDataPolicy};
pub use config::{AppConfig, RunSettings};
pub use data_structures::{
    AttributionReport, DateRange, HourlySpendRecord, PresenterSummary, ScheduleEntry,
    SkippedInterval, SpendRecord,
};
pub use error::{AttributionError, Result};
pub use identifier::{IntervalIdentifier, ScheduleRow, ScheduleTable};
pub use index::SpendIndex;
pub use loader::DataLoader;
pub use rounding::RoundingMethod;

pub use chrono::{NaiveDate, NaiveDateTime};

pub mod prelude {
    pub use crate::attributor::{run, SpendAttributor};
    pub use crate::config::{AppConfig, RunSettings};
    pub use crate::data_structures::{AttributionReport, DateRange, PresenterSummary};
    pub use crate::error::AttributionError;
    pub use crate::rounding::RoundingMethod;
    pub use anyhow::Result;
}
