//! Stock domain: articles, the stock ledger and the event that moves stock.
//!
//! An article's quantity is never edited directly. Every change goes through a
//! [`StockQuantityChanged`] event, which the article applies and turns into an
//! immutable [`StockHistory`] entry.

pub mod article;
pub mod event;
pub mod history;

pub use article::{Article, ArticleStatus, ArticleUpdate, NewArticle};
pub use event::{Reassort, StockQuantityChanged};
pub use history::{StockHistory, StockReason};
