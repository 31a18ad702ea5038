//! Infrastructure layer: persistence, stock/notification listeners and the
//! transactional services that tie the domain crates together.

pub mod error;
pub mod listeners;
pub mod services;
pub mod store;

pub use error::ServiceError;
