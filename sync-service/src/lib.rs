pub mod api;
pub mod auth;
pub mod chunk;
pub mod config;
pub mod error;
pub mod normalize;
pub mod observability;
pub mod store;
pub mod sync;

pub use error::SyncError;
pub use sync::{MeterOutcome, SyncEngine, SyncReport};
