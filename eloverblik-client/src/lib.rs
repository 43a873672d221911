pub mod db;
pub mod domain;
pub mod schema;

pub use domain::{ConsumptionRecord, MeterInfo, TariffRecord};
