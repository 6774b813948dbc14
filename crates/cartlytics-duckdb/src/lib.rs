pub mod error;
pub mod loader;
pub mod pipeline;
pub mod queries;
pub mod warehouse;

pub use error::{Result, WarehouseError};
pub use warehouse::Warehouse;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `cartlytics_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
