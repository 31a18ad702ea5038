use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use membership_core::{ArticleId, DomainError, DomainResult};
use membership_events::Event;

use crate::history::StockReason;

/// Event: the stock of one article changes by `delta` units.
///
/// Produced inside the transaction of the operation that caused it and applied
/// synchronously, exactly once, before that transaction commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuantityChanged {
    pub article_id: ArticleId,
    pub delta: i64,
    pub reason: StockReason,
    pub price: Option<u64>,
    pub occurred_at: DateTime<Utc>,
}

impl StockQuantityChanged {
    /// Units leave the stock because they were sold.
    ///
    /// A negative `sold_quantity` (a sale line that was reduced) puts units back.
    pub fn from_sale(
        article_id: ArticleId,
        sold_quantity: i64,
        price: u64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            article_id,
            delta: -sold_quantity,
            reason: StockReason::Sale,
            price: Some(price),
            occurred_at,
        }
    }

    /// Units enter the stock through a restocking.
    pub fn from_reassort(article_id: ArticleId, quantity: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            article_id,
            delta: quantity,
            reason: StockReason::Reassort,
            price: None,
            occurred_at,
        }
    }

    /// Units are taken out of the stock to be repaired.
    pub fn for_repair(article_id: ArticleId, quantity: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            article_id,
            delta: -quantity,
            reason: StockReason::Repair,
            price: None,
            occurred_at,
        }
    }
}

impl Event for StockQuantityChanged {
    fn event_type(&self) -> &'static str {
        "stock.quantity_changed"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Restocking request for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reassort {
    pub article_id: ArticleId,
    pub quantity: i64,
}

impl Reassort {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "reassort quantity must be positive (article {})",
                self.article_id
            )));
        }
        Ok(())
    }

    pub fn to_event(&self, occurred_at: DateTime<Utc>) -> StockQuantityChanged {
        StockQuantityChanged::from_reassort(self.article_id, self.quantity, occurred_at)
    }
}
