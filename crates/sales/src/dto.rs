//! Line-item view of a sale, as shown on point-of-sale terminals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use membership_core::{AdherentId, AggregateRoot, ArticleId, PaymentType, SaleId, SoldItemId};

use crate::sale::{Sale, SoldItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldItemDto {
    pub id: Option<SoldItemId>,
    pub article_id: ArticleId,
    pub quantity: i64,
    pub price: u64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDto {
    pub id: SaleId,
    pub version: u64,
    pub adherent_id: AdherentId,
    pub payment_type: PaymentType,
    pub finished: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sold_items: Vec<SoldItemDto>,
    pub total_price: i64,
}

impl From<&SoldItem> for SoldItemDto {
    fn from(item: &SoldItem) -> Self {
        Self {
            id: item.id,
            article_id: item.article_id,
            quantity: item.quantity,
            price: item.price,
            amount: item.amount(),
        }
    }
}

impl From<&Sale> for SaleDto {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id_typed(),
            version: sale.version(),
            adherent_id: sale.adherent_id(),
            payment_type: sale.payment_type(),
            finished: sale.is_finished(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
            sold_items: sale.items().iter().map(SoldItemDto::from).collect(),
            total_price: sale.total_price(),
        }
    }
}
