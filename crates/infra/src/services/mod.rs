//! Application services. Each public mutation runs in exactly one store
//! transaction; sale events are published only after it commits.

pub mod adherents;
pub mod sales;
pub mod stock;

pub use adherents::AdherentService;
pub use sales::SaleService;
pub use stock::StockService;
