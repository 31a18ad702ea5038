//! Reactions to domain events.
//!
//! Stock changes are applied synchronously inside the transaction that caused
//! them. Sale notifications run only for committed work, from a bus subscription.

pub mod sale_notification;
pub mod stock_quantity;

pub use sale_notification::{
    BroadcastError, Broadcaster, FINISHED_SALE, SaleNotificationListener, TEMPORARY_SALES,
};
pub use stock_quantity::StockQuantityListener;
