pub mod consumption;
pub mod meter_info;
pub mod tariff;

pub use consumption::ConsumptionRecord;
pub use meter_info::MeterInfo;
pub use tariff::TariffRecord;
