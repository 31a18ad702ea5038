//! Sale orchestration: reconciliation, stock propagation and after-commit events.
//!
//! ```text
//! update(payload)
//!   ↓ transaction
//!   1. load sale (NotFound)            4. apply each stock change (article + ledger)
//!   2. version check (Conflict)        5. persist sale
//!   3. reconcile lines (Lookup)        6. record SaleUpdated in the outbox
//!   ↓ commit
//!   7. publish outbox → notification listener (before the store is released,
//!      so events leave in commit order)
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use membership_core::{AdherentId, Page, PageRequest, SaleId};
use membership_events::{EventBus, Outbox};
use membership_sales::{
    NewSale, PriceChangePolicy, Sale, SaleCreated, SaleDeleted, SaleEvent, SaleStatistics,
    SaleUpdate, SaleUpdated, StockMovement, statistics_by_month,
};

use crate::error::ServiceError;
use crate::listeners::StockQuantityListener;
use crate::store::{Repositories, Store};

pub struct SaleService<S, B> {
    store: S,
    bus: B,
    stock: StockQuantityListener,
    price_change_policy: PriceChangePolicy,
}

fn ensure_adherent(repos: &dyn Repositories, id: AdherentId) -> Result<(), ServiceError> {
    match repos.find_adherent(id)? {
        Some(_) => Ok(()),
        None => Err(ServiceError::not_found(format!("adherent {id}"))),
    }
}

impl<S, B> SaleService<S, B>
where
    S: Store,
    B: EventBus<SaleEvent>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            stock: StockQuantityListener::new(),
            price_change_policy: PriceChangePolicy::default(),
        }
    }

    pub fn with_price_change_policy(mut self, policy: PriceChangePolicy) -> Self {
        self.price_change_policy = policy;
        self
    }

    pub fn price_change_policy(&self) -> PriceChangePolicy {
        self.price_change_policy
    }

    fn apply_movements(
        &self,
        repos: &mut dyn Repositories,
        movements: &[StockMovement],
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        for movement in movements.iter().filter(|m| m.sold_delta != 0) {
            self.stock.apply(repos, &movement.to_event(at))?;
        }
        Ok(())
    }

    /// Runs under the store lock, right after the commit that produced `outbox`.
    fn publish_committed(&self, (sale, outbox): (Sale, Outbox<SaleEvent>)) -> Sale {
        outbox.publish_to(&self.bus);
        sale
    }

    /// Persist a new sale, deduct the stock of its initial lines and announce it.
    pub fn new_sale(&self, input: NewSale) -> Result<Sale, ServiceError> {
        let sale = self.store.transaction_then(
            |repos| -> Result<_, ServiceError> {
                let mut sale = Sale::create(SaleId::new(), input)?;
                ensure_adherent(repos, sale.adherent_id())?;

                self.apply_movements(repos, &sale.initial_movements(), sale.created_at())?;
                repos.save_sale(&mut sale)?;

                let mut outbox = Outbox::new();
                outbox.record(SaleEvent::Created(SaleCreated {
                    sale: sale.clone(),
                    occurred_at: sale.created_at(),
                }));
                Ok((sale, outbox))
            },
            |committed| self.publish_committed(committed),
        )?;

        info!(
            sale_id = %sale.id_typed(),
            adherent_id = %sale.adherent_id(),
            lines = sale.items().len(),
            "sale created"
        );
        Ok(sale)
    }

    /// Merge the caller's view into the persisted sale.
    ///
    /// Only the stock difference caused by this call is applied, so replaying the
    /// same payload leaves stock untouched.
    pub fn update(&self, update: SaleUpdate) -> Result<Sale, ServiceError> {
        let policy = self.price_change_policy;

        let sale = self.store.transaction_then(
            |repos| -> Result<_, ServiceError> {
                let mut sale = repos
                    .find_sale(update.id)?
                    .ok_or_else(|| ServiceError::not_found(format!("sale {}", update.id)))?;

                if let Some(adherent_id) = update.adherent_id {
                    if adherent_id != sale.adherent_id() {
                        ensure_adherent(repos, adherent_id)?;
                    }
                }

                let movements = sale.reconcile(&update, policy)?;
                debug!(sale_id = %update.id, ?movements, "sale reconciled");

                self.apply_movements(repos, &movements, update.occurred_at)?;
                repos.save_sale(&mut sale)?;

                let mut outbox = Outbox::new();
                outbox.record(SaleEvent::Updated(SaleUpdated {
                    sale: sale.clone(),
                    occurred_at: update.occurred_at,
                }));
                Ok((sale, outbox))
            },
            |committed| self.publish_committed(committed),
        )?;

        info!(
            sale_id = %sale.id_typed(),
            finished = sale.is_finished(),
            "sale updated"
        );
        Ok(sale)
    }

    /// Remove a sale. Stock already deducted stays deducted.
    pub fn delete(&self, id: SaleId, occurred_at: DateTime<Utc>) -> Result<Sale, ServiceError> {
        let sale = self.store.transaction_then(
            |repos| -> Result<_, ServiceError> {
                let sale = repos
                    .find_sale(id)?
                    .ok_or_else(|| ServiceError::not_found(format!("sale {id}")))?;
                repos.delete_sale(id)?;

                let mut outbox = Outbox::new();
                outbox.record(SaleEvent::Deleted(SaleDeleted {
                    sale: sale.clone(),
                    occurred_at,
                }));
                Ok((sale, outbox))
            },
            |committed| self.publish_committed(committed),
        )?;

        info!(sale_id = %id, "sale deleted");
        Ok(sale)
    }

    pub fn get(&self, id: SaleId) -> Result<Sale, ServiceError> {
        self.store.read(|repos| -> Result<_, ServiceError> {
            repos
                .find_sale(id)?
                .ok_or_else(|| ServiceError::not_found(format!("sale {id}")))
        })
    }

    /// Finished sales, newest first. `offset` is a 1-based page number.
    pub fn history(&self, offset: Option<u32>, limit: Option<u32>) -> Result<Page<Sale>, ServiceError> {
        let page = PageRequest::new(offset, limit);
        self.store.read(|repos| -> Result<_, ServiceError> {
            let mut finished = repos.sales_by_status(true)?;
            finished.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            Ok(Page::from_sorted(finished, page))
        })
    }

    /// Sales still in progress, unordered.
    pub fn temporary_sales(&self) -> Result<Vec<Sale>, ServiceError> {
        self.store
            .read(|repos| repos.sales_by_status(false).map_err(ServiceError::from))
    }

    /// Monthly totals of sales and adhesions between `from` and `to`.
    pub fn statistics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SaleStatistics, ServiceError> {
        if from > to {
            return Err(ServiceError::Validation(
                "statistics range starts after it ends".to_string(),
            ));
        }
        self.store.read(|repos| -> Result<_, ServiceError> {
            let sales = repos.sales_created_between(from, to)?;
            let adhesions = repos.adhesion_dates_between(from.date_naive(), to.date_naive())?;
            Ok(statistics_by_month(&sales, adhesions, from, to))
        })
    }
}
