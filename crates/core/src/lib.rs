//! `membership-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod pagination;
pub mod payment;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AdherentId, AdhesionId, ArticleId, SaleId, SoldItemId, StockHistoryId, UserId};
pub use pagination::{Page, PageRequest};
pub use payment::PaymentType;
