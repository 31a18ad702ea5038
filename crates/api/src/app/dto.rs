//! Request/response bodies that are not domain types serialized as-is.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use membership_adherents::{AdhesionStatus, ExportFormat, ExportProperty, ExportRequest};
use membership_core::{AdherentId, ArticleId, PaymentType, SoldItemId, StockHistoryId};
use membership_infra::ServiceError;
use membership_sales::{NewSale, SaleUpdate, SoldItem};
use membership_stock::{Article, ArticleStatus, NewArticle, Reassort, StockHistory, StockReason};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldItemRequest {
    #[serde(default)]
    pub id: Option<SoldItemId>,
    pub article_id: ArticleId,
    pub quantity: i64,
    pub price: u64,
}

impl From<SoldItemRequest> for SoldItem {
    fn from(value: SoldItemRequest) -> Self {
        SoldItem {
            id: value.id,
            article_id: value.article_id,
            quantity: value.quantity,
            price: value.price,
        }
    }
}

/// Body of `POST /sales` and `PUT /sales/:id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    #[serde(default)]
    pub adherent_id: Option<AdherentId>,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub sold_items: Vec<SoldItemRequest>,
    /// Version the client last saw; omitted means "don't check".
    #[serde(default)]
    pub version: Option<u64>,
}

impl SaleRequest {
    pub fn into_new_sale(self, occurred_at: DateTime<Utc>) -> NewSale {
        NewSale {
            adherent_id: self.adherent_id,
            payment_type: self.payment_type,
            finished: self.finished,
            items: self.sold_items.into_iter().map(SoldItem::from).collect(),
            occurred_at,
        }
    }

    pub fn into_update(self, id: membership_core::SaleId, occurred_at: DateTime<Utc>) -> SaleUpdate {
        SaleUpdate {
            id,
            expected_version: self.version,
            adherent_id: self.adherent_id,
            payment_type: self.payment_type,
            finished: self.finished,
            items: self.sold_items.into_iter().map(SoldItem::from).collect(),
            occurred_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRequest {
    pub name: String,
    #[serde(default)]
    pub sale_price: Option<u64>,
    #[serde(default)]
    pub quantity: i64,
    /// Ignored on creation; a new article is always available.
    #[serde(default)]
    pub status: Option<ArticleStatus>,
}

impl From<ArticleRequest> for NewArticle {
    fn from(value: ArticleRequest) -> Self {
        NewArticle {
            name: value.name,
            sale_price: value.sale_price,
            initial_quantity: value.quantity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassortRequest {
    pub article_id: ArticleId,
    pub quantity: i64,
}

impl From<ReassortRequest> for Reassort {
    fn from(value: ReassortRequest) -> Self {
        Reassort {
            article_id: value.article_id,
            quantity: value.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub id: ArticleId,
    pub name: String,
    pub sale_price: Option<u64>,
    pub quantity: i64,
    pub status: ArticleStatus,
}

impl From<&Article> for ArticleDto {
    fn from(value: &Article) -> Self {
        Self {
            id: value.id_typed(),
            name: value.name().to_string(),
            sale_price: value.sale_price(),
            quantity: value.quantity(),
            status: value.status(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryDto {
    pub id: StockHistoryId,
    pub article_id: ArticleId,
    pub quantity: i64,
    pub reason: StockReason,
    pub price: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl From<StockHistory> for StockHistoryDto {
    fn from(value: StockHistory) -> Self {
        Self {
            id: value.id,
            article_id: value.article_id,
            quantity: value.quantity,
            reason: value.reason,
            price: value.price,
            created_at: value.created_at,
        }
    }
}

/// Body of `POST /adherents/export`: `properties` maps column keys to whether
/// they are selected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportRequestBody {
    pub format: Option<String>,
    pub properties: BTreeMap<String, bool>,
    pub status: Option<AdhesionStatus>,
}

impl ExportRequestBody {
    pub fn into_request(self) -> Result<ExportRequest, ServiceError> {
        Ok(ExportRequest {
            format: ExportFormat::parse(self.format.as_deref()),
            properties: ExportProperty::from_selection(&self.properties)?,
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sale_request_accepts_camel_case_and_defaults() {
        let body: SaleRequest = serde_json::from_value(json!({
            "adherentId": AdherentId::new(),
            "paymentType": "cash",
            "soldItems": [{ "articleId": ArticleId::new(), "quantity": 2, "price": 150 }]
        }))
        .unwrap();

        assert!(!body.finished);
        assert_eq!(body.version, None);
        let sale = body.into_new_sale(Utc::now());
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].id, None);
    }

    #[test]
    fn unknown_export_column_is_a_validation_error() {
        let body = ExportRequestBody {
            format: Some("json".to_string()),
            properties: BTreeMap::from([("shoeSize".to_string(), true)]),
            status: None,
        };
        assert!(matches!(body.into_request(), Err(ServiceError::Validation(_))));
    }
}
