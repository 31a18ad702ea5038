//! Sales domain: the `Sale` aggregate and its line items.
//!
//! Updating a sale is delta-based: [`Sale::reconcile`] returns only the stock
//! movements caused by *this* update, so replaying the same payload never
//! deducts stock twice.

pub mod dto;
pub mod event;
pub mod sale;
pub mod statistics;

pub use dto::{SaleDto, SoldItemDto};
pub use event::{SaleCreated, SaleDeleted, SaleEvent, SaleUpdated};
pub use membership_core::PaymentType;
pub use sale::{NewSale, PriceChangePolicy, Sale, SaleUpdate, SoldItem, StockMovement};
pub use statistics::{MonthlyStatistics, SaleStatistics, statistics_by_month};
