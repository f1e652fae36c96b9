//! Zone registry.

pub mod errors;
pub mod models;
mod repository;
pub mod service;

pub use errors::ZonesServiceError;
pub use service::*;
