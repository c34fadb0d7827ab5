//! Data Transfer Objects for REST query parameters and responses.

pub mod pool_dto;
pub mod telemetry_dto;

pub use pool_dto::*;
pub use telemetry_dto::*;
