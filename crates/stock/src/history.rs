use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use membership_core::{ArticleId, StockHistoryId};

/// Why an article's stock moved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockReason {
    Sale,
    Reassort,
    Repair,
}

/// One immutable entry of the stock ledger.
///
/// `quantity` is the signed delta that was applied to the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockHistory {
    pub id: StockHistoryId,
    pub article_id: ArticleId,
    pub quantity: i64,
    pub reason: StockReason,
    pub price: Option<u64>,
    pub created_at: DateTime<Utc>,
}
