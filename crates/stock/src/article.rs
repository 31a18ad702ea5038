use serde::{Deserialize, Serialize};

use membership_core::{ArticleId, DomainError, DomainResult, Entity, StockHistoryId};

use crate::event::StockQuantityChanged;
use crate::history::{StockHistory, StockReason};

/// Whether an article is on the shelf or in the workshop.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleStatus {
    #[default]
    Available,
    UnderRepair,
}

/// A stocked, sellable article.
///
/// `sale_price` is an advisory minimum price in cents; sale lines may be priced
/// differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    id: ArticleId,
    name: String,
    sale_price: Option<u64>,
    quantity: i64,
    status: ArticleStatus,
}

/// Input for creating an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub name: String,
    #[serde(default)]
    pub sale_price: Option<u64>,
    /// Units on hand at creation, booked as a reassort by the caller.
    #[serde(default)]
    pub initial_quantity: i64,
}

/// Input for editing an article's catalog fields. Stock is not editable here.
///
/// A missing `status` keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleUpdate {
    pub name: String,
    #[serde(default)]
    pub sale_price: Option<u64>,
    #[serde(default)]
    pub status: Option<ArticleStatus>,
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("article name cannot be empty"));
    }
    Ok(name.to_string())
}

impl Article {
    /// A new article starts with an empty stock; initial units come in through a reassort.
    pub fn create(id: ArticleId, input: NewArticle) -> DomainResult<Self> {
        if input.initial_quantity < 0 {
            return Err(DomainError::validation("initial quantity cannot be negative"));
        }
        Ok(Self {
            id,
            name: validate_name(&input.name)?,
            sale_price: input.sale_price,
            quantity: 0,
            status: ArticleStatus::Available,
        })
    }

    pub fn id_typed(&self) -> ArticleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sale_price(&self) -> Option<u64> {
        self.sale_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> ArticleStatus {
        self.status
    }

    pub fn update(&mut self, input: ArticleUpdate) -> DomainResult<()> {
        self.name = validate_name(&input.name)?;
        self.sale_price = input.sale_price;
        if let Some(status) = input.status {
            self.status = status;
        }
        Ok(())
    }

    /// True when `price` is below the advisory sale price.
    pub fn is_sold_below_price(&self, price: u64) -> bool {
        self.sale_price.is_some_and(|min| price < min)
    }

    /// Apply a stock change and produce the matching ledger entry.
    ///
    /// The resulting quantity may go negative; callers decide whether to warn.
    /// A change that does not fit in an `i64` is rejected and leaves the article
    /// untouched. A repair puts the article under repair.
    pub fn apply_stock_change(
        &mut self,
        change: &StockQuantityChanged,
        history_id: StockHistoryId,
    ) -> DomainResult<StockHistory> {
        if change.article_id != self.id {
            return Err(DomainError::invariant(format!(
                "stock change for article {} applied to article {}",
                change.article_id, self.id
            )));
        }

        self.quantity = self.quantity.checked_add(change.delta).ok_or_else(|| {
            DomainError::validation(format!(
                "stock of article {} cannot move by {} from {}",
                self.id, change.delta, self.quantity
            ))
        })?;
        if change.reason == StockReason::Repair {
            self.status = ArticleStatus::UnderRepair;
        }

        Ok(StockHistory {
            id: history_id,
            article_id: self.id,
            quantity: change.delta,
            reason: change.reason,
            price: change.price,
            created_at: change.occurred_at,
        })
    }
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn article() -> Article {
        Article::create(
            ArticleId::new(),
            NewArticle {
                name: "Chambre à air 26\"".to_string(),
                sale_price: Some(500),
                initial_quantity: 0,
            },
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_blank_name() {
        let err = Article::create(
            ArticleId::new(),
            NewArticle {
                name: "   ".to_string(),
                sale_price: None,
                initial_quantity: 0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_article_has_empty_stock() {
        assert_eq!(article().quantity(), 0);
    }

    #[test]
    fn stock_change_moves_quantity_and_records_history() {
        let mut a = article();
        a.apply_stock_change(
            &StockQuantityChanged::from_reassort(a.id_typed(), 20, Utc::now()),
            StockHistoryId::new(),
        )
        .unwrap();

        let entry = a
            .apply_stock_change(
                &StockQuantityChanged::from_sale(a.id_typed(), 3, 450, Utc::now()),
                StockHistoryId::new(),
            )
            .unwrap();

        assert_eq!(a.quantity(), 17);
        assert_eq!(entry.quantity, -3);
        assert_eq!(entry.reason, StockReason::Sale);
        assert_eq!(entry.price, Some(450));
    }

    #[test]
    fn stock_change_for_another_article_is_rejected() {
        let mut a = article();
        let foreign = StockQuantityChanged::from_reassort(ArticleId::new(), 1, Utc::now());
        let err = a.apply_stock_change(&foreign, StockHistoryId::new()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(a.quantity(), 0);
    }

    #[test]
    fn overflowing_stock_change_is_rejected_without_moving_stock() {
        let mut a = article();
        a.apply_stock_change(
            &StockQuantityChanged::from_sale(a.id_typed(), i64::MAX, 1, Utc::now()),
            StockHistoryId::new(),
        )
        .unwrap();

        let err = a
            .apply_stock_change(
                &StockQuantityChanged::from_sale(a.id_typed(), i64::MAX, 1, Utc::now()),
                StockHistoryId::new(),
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(a.quantity(), -i64::MAX);
    }

    #[test]
    fn repair_marks_the_article_under_repair() {
        let mut a = article();
        assert_eq!(a.status(), ArticleStatus::Available);

        a.apply_stock_change(
            &StockQuantityChanged::for_repair(a.id_typed(), 1, Utc::now()),
            StockHistoryId::new(),
        )
        .unwrap();
        assert_eq!(a.status(), ArticleStatus::UnderRepair);

        a.apply_stock_change(
            &StockQuantityChanged::from_reassort(a.id_typed(), 1, Utc::now()),
            StockHistoryId::new(),
        )
        .unwrap();
        assert_eq!(a.status(), ArticleStatus::UnderRepair);
    }

    #[test]
    fn update_keeps_status_unless_given() {
        let mut a = article();
        a.update(ArticleUpdate {
            name: "Chambre à air 28\"".to_string(),
            sale_price: None,
            status: Some(ArticleStatus::UnderRepair),
        })
        .unwrap();
        assert_eq!(a.status(), ArticleStatus::UnderRepair);

        a.update(ArticleUpdate {
            name: "Chambre à air 28\"".to_string(),
            sale_price: Some(400),
            status: None,
        })
        .unwrap();
        assert_eq!(a.status(), ArticleStatus::UnderRepair);
        assert_eq!(a.sale_price(), Some(400));
    }

    #[test]
    fn below_price_detection() {
        let a = article();
        assert!(a.is_sold_below_price(499));
        assert!(!a.is_sold_below_price(500));
    }

    proptest! {
        #[test]
        fn quantity_equals_sum_of_history(deltas in proptest::collection::vec(-50i64..50, 0..40)) {
            let mut a = article();
            let mut ledger = 0i64;
            for delta in deltas {
                let change = StockQuantityChanged::from_reassort(a.id_typed(), delta, Utc::now());
                let entry = a.apply_stock_change(&change, StockHistoryId::new()).unwrap();
                ledger += entry.quantity;
            }
            prop_assert_eq!(a.quantity(), ledger);
        }
    }
}
