pub mod consumption_queries;

pub use consumption_queries::{
    distinct_meters, distinct_years, load_profile, yearly_totals, YearlyTotal,
};
