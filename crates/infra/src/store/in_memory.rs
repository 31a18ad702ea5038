use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

use membership_adherents::Adherent;
use membership_core::{AdherentId, ArticleId, Entity, Page, PageRequest, SaleId, SoldItemId};
use membership_sales::Sale;
use membership_stock::{Article, StockHistory};

use super::{
    AdherentRepository, ArticleRepository, Repositories, SaleRepository, StockHistoryRepository,
    Store, StoreError,
};

#[derive(Debug, Clone, Default)]
struct State {
    sales: HashMap<SaleId, Sale>,
    articles: HashMap<ArticleId, Article>,
    history: Vec<StockHistory>,
    adherents: HashMap<AdherentId, Adherent>,
}

/// In-memory store for tests/dev.
///
/// A transaction runs against a copy of the whole state while holding the store
/// lock, and the copy replaces the state only when the work succeeds. Every
/// transaction is therefore atomic and fully serialized.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn transaction_then<T, R, E, F, C>(&self, work: F, on_commit: C) -> Result<R, E>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, E>,
        C: FnOnce(T) -> R,
        E: From<StoreError>,
    {
        let mut committed = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let mut working = committed.clone();
        let out = work(&mut working)?;
        *committed = working;
        // Still under the lock: the next transaction waits for the hook.
        Ok(on_commit(out))
    }

    fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<StoreError>,
    {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        work(&*state)
    }
}

/// Insert or replace an entity under its own id.
fn upsert<E: Entity>(map: &mut HashMap<E::Id, E>, entity: E) {
    map.insert(entity.id().clone(), entity);
}

impl SaleRepository for State {
    fn find_sale(&self, id: SaleId) -> Result<Option<Sale>, StoreError> {
        Ok(self.sales.get(&id).cloned())
    }

    fn save_sale(&mut self, sale: &mut Sale) -> Result<(), StoreError> {
        sale.assign_item_ids(SoldItemId::new);
        self.sales.insert(sale.id_typed(), sale.clone());
        Ok(())
    }

    fn delete_sale(&mut self, id: SaleId) -> Result<bool, StoreError> {
        Ok(self.sales.remove(&id).is_some())
    }

    fn sales_by_status(&self, finished: bool) -> Result<Vec<Sale>, StoreError> {
        Ok(self
            .sales
            .values()
            .filter(|s| s.is_finished() == finished)
            .cloned()
            .collect())
    }

    fn sales_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Sale>, StoreError> {
        Ok(self
            .sales
            .values()
            .filter(|s| s.created_at() >= from && s.created_at() <= to)
            .cloned()
            .collect())
    }
}

impl ArticleRepository for State {
    fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        Ok(self.articles.get(&id).cloned())
    }

    fn save_article(&mut self, article: Article) -> Result<(), StoreError> {
        upsert(&mut self.articles, article);
        Ok(())
    }

    fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let mut all: Vec<Article> = self.articles.values().cloned().collect();
        all.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
        Ok(all)
    }
}

impl StockHistoryRepository for State {
    fn append_stock_history(&mut self, entry: StockHistory) -> Result<(), StoreError> {
        self.history.push(entry);
        Ok(())
    }

    fn stock_history(
        &self,
        article_id: ArticleId,
        page: PageRequest,
    ) -> Result<Page<StockHistory>, StoreError> {
        // Entries are appended in commit order; reverse it for newest first.
        let mut entries: Vec<StockHistory> = self
            .history
            .iter()
            .rev()
            .filter(|h| h.article_id == article_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| Reverse(h.created_at));
        Ok(Page::from_sorted(entries, page))
    }
}

fn sorted_adherents<'a>(adherents: impl Iterator<Item = &'a Adherent>) -> Vec<Adherent> {
    let mut all: Vec<Adherent> = adherents.cloned().collect();
    all.sort_by_key(Adherent::sort_key);
    all
}

impl AdherentRepository for State {
    fn find_adherent(&self, id: AdherentId) -> Result<Option<Adherent>, StoreError> {
        Ok(self.adherents.get(&id).cloned())
    }

    fn save_adherent(&mut self, adherent: Adherent) -> Result<(), StoreError> {
        upsert(&mut self.adherents, adherent);
        Ok(())
    }

    fn delete_adherent(&mut self, id: AdherentId) -> Result<bool, StoreError> {
        Ok(self.adherents.remove(&id).is_some())
    }

    fn adherents_page(&self, page: PageRequest) -> Result<Page<Adherent>, StoreError> {
        Ok(Page::from_sorted(sorted_adherents(self.adherents.values()), page))
    }

    fn search_adherents(
        &self,
        criteria: &str,
        page: PageRequest,
    ) -> Result<Page<Adherent>, StoreError> {
        let matching = sorted_adherents(self.adherents.values().filter(|a| a.matches(criteria)));
        Ok(Page::from_sorted(matching, page))
    }

    fn adhesion_dates_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self
            .adherents
            .values()
            .flat_map(|a| a.adhesions().iter().map(|ad| ad.date))
            .filter(|d| *d >= from && *d <= to)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membership_stock::NewArticle;

    fn article(name: &str) -> Article {
        Article::create(
            ArticleId::new(),
            NewArticle {
                name: name.to_string(),
                sale_price: None,
                initial_quantity: 0,
            },
        )
        .unwrap()
    }

    #[derive(Debug)]
    struct Abort;

    impl From<StoreError> for Abort {
        fn from(_: StoreError) -> Self {
            Abort
        }
    }

    #[test]
    fn committed_work_is_visible() {
        let store = InMemoryStore::new();
        let a = article("Pneu");
        let id = a.id_typed();

        store
            .transaction(|repos| repos.save_article(a.clone()).map_err(Abort::from))
            .unwrap();

        let found = store
            .read(|repos| repos.find_article(id).map_err(Abort::from))
            .unwrap();
        assert_eq!(found, Some(a));
    }

    #[test]
    fn failed_work_is_rolled_back() {
        let store = InMemoryStore::new();
        let a = article("Pneu");
        let id = a.id_typed();

        let result: Result<(), Abort> = store.transaction(|repos| {
            repos.save_article(a)?;
            Err(Abort)
        });

        assert!(result.is_err());
        let found = store
            .read(|repos| repos.find_article(id).map_err(Abort::from))
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn commit_hook_runs_before_the_store_is_released() {
        let store = InMemoryStore::new();
        let a = article("Pneu");
        let id = a.id_typed();

        let locked_during_hook = store
            .transaction_then(
                |repos| repos.save_article(a).map_err(Abort::from),
                |()| store.state.try_lock().is_err(),
            )
            .unwrap();

        assert!(locked_during_hook);
        let found = store
            .read(|repos| repos.find_article(id).map_err(Abort::from))
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn commit_hook_is_skipped_on_rollback() {
        let store = InMemoryStore::new();
        let mut hooked = false;

        let result: Result<(), Abort> =
            store.transaction_then(|_| Err(Abort), |()| hooked = true);

        assert!(result.is_err());
        assert!(!hooked);
    }

    #[test]
    fn saving_an_article_again_replaces_it() {
        let store = InMemoryStore::new();
        let mut a = article("Pneu");
        store
            .transaction(|repos| repos.save_article(a.clone()).map_err(Abort::from))
            .unwrap();

        a.update(membership_stock::ArticleUpdate {
            name: "Pneu 700x28".to_string(),
            sale_price: Some(900),
            status: None,
        })
        .unwrap();
        store
            .transaction(|repos| repos.save_article(a.clone()).map_err(Abort::from))
            .unwrap();

        let all = store
            .read(|repos| repos.list_articles().map_err(Abort::from))
            .unwrap();
        assert_eq!(all, vec![a]);
    }

    #[test]
    fn articles_are_listed_by_name() {
        let store = InMemoryStore::new();
        store
            .transaction(|repos| {
                repos.save_article(article("selle"))?;
                repos.save_article(article("Chaîne"))?;
                Ok::<_, Abort>(())
            })
            .unwrap();

        let names: Vec<String> = store
            .read(|repos| repos.list_articles().map_err(Abort::from))
            .unwrap()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["Chaîne", "selle"]);
    }
}
