//! Persistence contract for the membership core.
//!
//! Repositories are grouped behind [`Repositories`] and only ever reached through
//! [`Store::transaction`] (or [`Store::read`]), so every mutation of a sale, its
//! stock ledger entries and the touched articles commits or rolls back together.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use membership_adherents::Adherent;
use membership_core::{AdherentId, ArticleId, Page, PageRequest, SaleId};
use membership_sales::Sale;
use membership_stock::{Article, StockHistory};

pub mod in_memory;

pub use in_memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A previous transaction panicked while holding the store.
    #[error("store lock poisoned")]
    Poisoned,

    #[error("backend failure: {0}")]
    Backend(String),
}

pub trait SaleRepository {
    fn find_sale(&self, id: SaleId) -> Result<Option<Sale>, StoreError>;

    /// Insert or replace; lines without an id receive one.
    fn save_sale(&mut self, sale: &mut Sale) -> Result<(), StoreError>;

    /// Returns whether a sale was removed.
    fn delete_sale(&mut self, id: SaleId) -> Result<bool, StoreError>;

    /// Sales with the given `finished` flag, in no particular order.
    fn sales_by_status(&self, finished: bool) -> Result<Vec<Sale>, StoreError>;

    fn sales_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Sale>, StoreError>;
}

pub trait ArticleRepository {
    fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;

    fn save_article(&mut self, article: Article) -> Result<(), StoreError>;

    /// All articles ordered by name.
    fn list_articles(&self) -> Result<Vec<Article>, StoreError>;
}

pub trait StockHistoryRepository {
    fn append_stock_history(&mut self, entry: StockHistory) -> Result<(), StoreError>;

    /// Ledger of one article, newest first.
    fn stock_history(
        &self,
        article_id: ArticleId,
        page: PageRequest,
    ) -> Result<Page<StockHistory>, StoreError>;
}

pub trait AdherentRepository {
    fn find_adherent(&self, id: AdherentId) -> Result<Option<Adherent>, StoreError>;

    fn save_adherent(&mut self, adherent: Adherent) -> Result<(), StoreError>;

    fn delete_adherent(&mut self, id: AdherentId) -> Result<bool, StoreError>;

    /// Members ordered by last then first name.
    fn adherents_page(&self, page: PageRequest) -> Result<Page<Adherent>, StoreError>;

    fn search_adherents(
        &self,
        criteria: &str,
        page: PageRequest,
    ) -> Result<Page<Adherent>, StoreError>;

    fn adhesion_dates_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError>;
}

/// Every repository, as seen from inside one transaction.
pub trait Repositories:
    SaleRepository + ArticleRepository + StockHistoryRepository + AdherentRepository
{
}

impl<T> Repositories for T where
    T: SaleRepository + ArticleRepository + StockHistoryRepository + AdherentRepository + ?Sized
{
}

/// Transaction boundary.
///
/// `work` returning `Ok` commits every change it made; `Err` discards all of them.
/// Implementations must keep concurrent transactions from interleaving on the
/// same records (the in-memory store serializes all of them).
pub trait Store: Send + Sync {
    /// Run `work` and, once it has committed, hand its output to `on_commit`
    /// before any other transaction can start. Whatever `on_commit` does (such
    /// as publishing events) therefore happens in commit order. It is not
    /// called when `work` fails.
    fn transaction_then<T, R, E, F, C>(&self, work: F, on_commit: C) -> Result<R, E>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, E>,
        C: FnOnce(T) -> R,
        E: From<StoreError>;

    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.transaction_then(work, |out| out)
    }

    /// Read-only access to a consistent snapshot.
    fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<StoreError>;
}

impl<S> Store for Arc<S>
where
    S: Store,
{
    fn transaction_then<T, R, E, F, C>(&self, work: F, on_commit: C) -> Result<R, E>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, E>,
        C: FnOnce(T) -> R,
        E: From<StoreError>,
    {
        (**self).transaction_then(work, on_commit)
    }

    fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).read(work)
    }
}
