use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use membership_core::{
    AdherentId, AggregateRoot, ArticleId, DomainError, DomainResult, ExpectedVersion, PaymentType,
    SaleId, SoldItemId,
};
use membership_stock::StockQuantityChanged;

/// One line of a sale.
///
/// `id` is `None` until the line has been persisted. `price` is the unit price in
/// cents actually charged, which may differ from the article's advisory price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldItem {
    #[serde(default)]
    pub id: Option<SoldItemId>,
    pub article_id: ArticleId,
    pub quantity: i64,
    pub price: u64,
}

impl SoldItem {
    pub fn new(article_id: ArticleId, quantity: i64, price: u64) -> Self {
        Self {
            id: None,
            article_id,
            quantity,
            price,
        }
    }

    pub fn amount(&self) -> i64 {
        self.quantity.saturating_mul(i64::try_from(self.price).unwrap_or(i64::MAX))
    }
}

/// What to do when an incoming line carries a different price than the persisted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceChangePolicy {
    /// Keep the existing line untouched and append a fresh line with the incoming
    /// quantity and price; stock drops by the incoming quantity.
    #[default]
    AppendLine,
    /// Rewrite the existing line's price and quantity in place; stock moves by the
    /// quantity difference only.
    Reprice,
}

/// Stock effect of one reconciled line: `sold_delta` more units of `article_id`
/// left the shop (negative when units came back).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub article_id: ArticleId,
    pub sold_delta: i64,
    pub price: u64,
}

impl StockMovement {
    pub fn to_event(self, occurred_at: DateTime<Utc>) -> StockQuantityChanged {
        StockQuantityChanged::from_sale(self.article_id, self.sold_delta, self.price, occurred_at)
    }
}

/// Input: create a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub adherent_id: Option<AdherentId>,
    pub payment_type: Option<PaymentType>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub items: Vec<SoldItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Input: the caller's current view of an existing sale.
///
/// `expected_version` is the version the caller last read; when present and stale
/// the update fails with a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub id: SaleId,
    #[serde(default)]
    pub expected_version: Option<u64>,
    pub adherent_id: Option<AdherentId>,
    pub payment_type: Option<PaymentType>,
    pub finished: bool,
    pub items: Vec<SoldItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: Sale.
///
/// Line items are owned by the sale and only reachable read-only from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    id: SaleId,
    adherent_id: AdherentId,
    payment_type: PaymentType,
    items: Vec<SoldItem>,
    finished: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Planned change for one incoming line, computed before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LinePlan {
    Append(SoldItem),
    SetQuantity { index: usize, quantity: i64 },
    Reprice { index: usize, quantity: i64, price: u64 },
}

fn require_header(
    adherent_id: Option<AdherentId>,
    payment_type: Option<PaymentType>,
) -> DomainResult<(AdherentId, PaymentType)> {
    let adherent_id =
        adherent_id.ok_or_else(|| DomainError::validation("a sale requires an adherent"))?;
    let payment_type =
        payment_type.ok_or_else(|| DomainError::validation("a sale requires a payment type"))?;
    Ok((adherent_id, payment_type))
}

fn validate_new_line(item: &SoldItem) -> DomainResult<()> {
    if item.quantity <= 0 {
        return Err(DomainError::validation(format!(
            "sold quantity must be positive (article {})",
            item.article_id
        )));
    }
    Ok(())
}

impl Sale {
    /// Build a new, not yet persisted sale. Its initial lines have no ids.
    pub fn create(id: SaleId, input: NewSale) -> DomainResult<Self> {
        let (adherent_id, payment_type) = require_header(input.adherent_id, input.payment_type)?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            if item.id.is_some() {
                return Err(DomainError::validation(
                    "a new sale cannot reference existing line items",
                ));
            }
            validate_new_line(&item)?;
            items.push(item);
        }

        Ok(Self {
            id,
            adherent_id,
            payment_type,
            items,
            finished: input.finished,
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn adherent_id(&self) -> AdherentId {
        self.adherent_id
    }

    pub fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    pub fn items(&self) -> &[SoldItem] {
        &self.items
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sum of the line amounts in cents, saturating at the `i64` bounds.
    pub fn total_price(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, item| acc.saturating_add(item.amount()))
    }

    /// Stock movements for a sale as first created (one per line).
    pub fn initial_movements(&self) -> Vec<StockMovement> {
        self.items
            .iter()
            .map(|item| StockMovement {
                article_id: item.article_id,
                sold_delta: item.quantity,
                price: item.price,
            })
            .collect()
    }

    /// Append a new line; returns the stock movement it causes.
    pub fn add_item(&mut self, article_id: ArticleId, quantity: i64, price: u64) -> DomainResult<StockMovement> {
        let item = SoldItem::new(article_id, quantity, price);
        validate_new_line(&item)?;
        self.items.push(item);
        Ok(StockMovement {
            article_id,
            sold_delta: quantity,
            price,
        })
    }

    /// Set a persisted line's quantity; returns `new - old`.
    pub fn change_item_quantity(&mut self, item_id: SoldItemId, quantity: i64) -> DomainResult<i64> {
        if quantity < 0 {
            return Err(DomainError::validation("sold quantity cannot be negative"));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == Some(item_id))
            .ok_or_else(|| DomainError::lookup(format!("sold item {item_id} is not part of sale {}", self.id)))?;
        let delta = quantity - item.quantity;
        item.quantity = quantity;
        Ok(delta)
    }

    /// Give an id to every line that does not have one yet. Called by persistence.
    pub fn assign_item_ids(&mut self, mut next: impl FnMut() -> SoldItemId) {
        for item in self.items.iter_mut().filter(|i| i.id.is_none()) {
            item.id = Some(next());
        }
    }

    /// Merge the caller's view of the sale into this one.
    ///
    /// Every incoming line is validated first; on error nothing has been changed.
    /// On success the header fields are overwritten, the version is bumped and the
    /// stock movements caused by this update alone are returned.
    pub fn reconcile(
        &mut self,
        update: &SaleUpdate,
        policy: PriceChangePolicy,
    ) -> DomainResult<Vec<StockMovement>> {
        if update.id != self.id {
            return Err(DomainError::invariant(format!(
                "update for sale {} applied to sale {}",
                update.id, self.id
            )));
        }
        ExpectedVersion::from(update.expected_version).check(self.version)?;
        let (adherent_id, payment_type) = require_header(update.adherent_id, update.payment_type)?;

        let plan = self.plan(&update.items, policy)?;
        let movements = self.apply_plan(plan);

        self.adherent_id = adherent_id;
        self.payment_type = payment_type;
        self.finished = update.finished;
        self.updated_at = update.occurred_at;
        self.version += 1;

        Ok(movements)
    }

    /// Bump the version after a change that did not go through `reconcile`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }

    fn plan(&self, incoming: &[SoldItem], policy: PriceChangePolicy) -> DomainResult<Vec<LinePlan>> {
        let mut seen = HashSet::new();
        let mut plan = Vec::with_capacity(incoming.len());

        for item in incoming {
            let Some(item_id) = item.id else {
                validate_new_line(item)?;
                plan.push(LinePlan::Append(SoldItem::new(item.article_id, item.quantity, item.price)));
                continue;
            };

            if !seen.insert(item_id) {
                return Err(DomainError::validation(format!(
                    "sold item {item_id} appears more than once"
                )));
            }

            let index = self
                .items
                .iter()
                .position(|existing| existing.id == Some(item_id))
                .ok_or_else(|| {
                    DomainError::lookup(format!("sold item {item_id} is not part of sale {}", self.id))
                })?;
            let existing = &self.items[index];

            if existing.price != item.price {
                match policy {
                    PriceChangePolicy::AppendLine => {
                        // The appended line is a sale of its own: zero units is refused.
                        validate_new_line(item)?;
                        plan.push(LinePlan::Append(SoldItem::new(
                            item.article_id,
                            item.quantity,
                            item.price,
                        )));
                    }
                    PriceChangePolicy::Reprice => {
                        if item.quantity < 0 {
                            return Err(DomainError::validation("sold quantity cannot be negative"));
                        }
                        plan.push(LinePlan::Reprice {
                            index,
                            quantity: item.quantity,
                            price: item.price,
                        });
                    }
                }
            } else if existing.quantity != item.quantity {
                if item.quantity < 0 {
                    return Err(DomainError::validation("sold quantity cannot be negative"));
                }
                plan.push(LinePlan::SetQuantity {
                    index,
                    quantity: item.quantity,
                });
            }
        }

        Ok(plan)
    }

    fn apply_plan(&mut self, plan: Vec<LinePlan>) -> Vec<StockMovement> {
        let mut movements = Vec::with_capacity(plan.len());

        for step in plan {
            match step {
                LinePlan::Append(item) => {
                    movements.push(StockMovement {
                        article_id: item.article_id,
                        sold_delta: item.quantity,
                        price: item.price,
                    });
                    self.items.push(item);
                }
                LinePlan::SetQuantity { index, quantity } => {
                    let line = &mut self.items[index];
                    let delta = quantity - line.quantity;
                    line.quantity = quantity;
                    movements.push(StockMovement {
                        article_id: line.article_id,
                        sold_delta: delta,
                        price: line.price,
                    });
                }
                LinePlan::Reprice {
                    index,
                    quantity,
                    price,
                } => {
                    let line = &mut self.items[index];
                    let delta = quantity - line.quantity;
                    line.quantity = quantity;
                    line.price = price;
                    if delta != 0 {
                        movements.push(StockMovement {
                            article_id: line.article_id,
                            sold_delta: delta,
                            price,
                        });
                    }
                }
            }
        }

        movements
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
