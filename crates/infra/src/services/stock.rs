use chrono::{DateTime, Utc};
use tracing::info;

use membership_core::{ArticleId, Page, PageRequest};
use membership_stock::{
    Article, ArticleUpdate, NewArticle, Reassort, StockHistory, StockQuantityChanged,
};

use crate::error::ServiceError;
use crate::listeners::StockQuantityListener;
use crate::store::Store;

/// Article catalogue and manual stock movements (reassort, repair).
pub struct StockService<S> {
    store: S,
    stock: StockQuantityListener,
}

impl<S: Store> StockService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            stock: StockQuantityListener::new(),
        }
    }

    /// Create an article. A positive initial quantity is booked as a reassort so
    /// that the ledger explains the starting stock.
    pub fn create_article(
        &self,
        input: NewArticle,
        at: DateTime<Utc>,
    ) -> Result<Article, ServiceError> {
        let initial = input.initial_quantity;
        let article = self.store.transaction(|repos| -> Result<_, ServiceError> {
            let article = Article::create(ArticleId::new(), input)?;
            let id = article.id_typed();
            repos.save_article(article)?;
            if initial > 0 {
                self.stock
                    .apply(repos, &StockQuantityChanged::from_reassort(id, initial, at))?;
            }
            repos
                .find_article(id)?
                .ok_or_else(|| ServiceError::not_found(format!("article {id}")))
        })?;

        info!(article_id = %article.id_typed(), name = article.name(), "article created");
        Ok(article)
    }

    pub fn update_article(
        &self,
        id: ArticleId,
        input: ArticleUpdate,
    ) -> Result<Article, ServiceError> {
        self.store.transaction(|repos| -> Result<_, ServiceError> {
            let mut article = repos
                .find_article(id)?
                .ok_or_else(|| ServiceError::not_found(format!("article {id}")))?;
            article.update(input)?;
            repos.save_article(article.clone())?;
            Ok(article)
        })
    }

    pub fn get_article(&self, id: ArticleId) -> Result<Article, ServiceError> {
        self.store.read(|repos| -> Result<_, ServiceError> {
            repos
                .find_article(id)?
                .ok_or_else(|| ServiceError::not_found(format!("article {id}")))
        })
    }

    pub fn list_articles(&self) -> Result<Vec<Article>, ServiceError> {
        self.store
            .read(|repos| repos.list_articles().map_err(ServiceError::from))
    }

    /// Restock several articles at once. All lines are validated before any
    /// stock moves; one unknown article rolls the whole batch back.
    pub fn reassort(
        &self,
        lines: Vec<Reassort>,
        at: DateTime<Utc>,
    ) -> Result<Vec<StockHistory>, ServiceError> {
        for line in &lines {
            line.validate()?;
        }

        let entries = self.store.transaction(|repos| -> Result<_, ServiceError> {
            let mut entries = Vec::with_capacity(lines.len());
            for line in &lines {
                entries.push(self.stock.apply(repos, &line.to_event(at))?);
            }
            Ok(entries)
        })?;

        info!(lines = entries.len(), "stock reassorted");
        Ok(entries)
    }

    /// Take one unit out of stock for the workshop; the article becomes
    /// `UnderRepair` until an update makes it available again.
    pub fn send_for_repair(
        &self,
        id: ArticleId,
        at: DateTime<Utc>,
    ) -> Result<StockHistory, ServiceError> {
        let entry = self.store.transaction(|repos| -> Result<_, ServiceError> {
            self.stock
                .apply(repos, &StockQuantityChanged::for_repair(id, 1, at))
        })?;

        info!(article_id = %id, "article sent for repair");
        Ok(entry)
    }

    /// Ledger of one article, newest first.
    pub fn history(
        &self,
        id: ArticleId,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Page<StockHistory>, ServiceError> {
        let page = PageRequest::new(offset, limit);
        self.store.read(|repos| -> Result<_, ServiceError> {
            if repos.find_article(id)?.is_none() {
                return Err(ServiceError::not_found(format!("article {id}")));
            }
            Ok(repos.stock_history(id, page)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use membership_stock::{ArticleStatus, StockReason};

    fn service() -> StockService<InMemoryStore> {
        StockService::new(InMemoryStore::new())
    }

    fn new_article(name: &str, initial_quantity: i64) -> NewArticle {
        NewArticle {
            name: name.to_string(),
            sale_price: Some(1200),
            initial_quantity,
        }
    }

    #[test]
    fn initial_quantity_is_booked_as_reassort() {
        let svc = service();
        let article = svc.create_article(new_article("Chambre à air", 5), Utc::now()).unwrap();
        assert_eq!(article.quantity(), 5);

        let history = svc.history(article.id_typed(), None, None).unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.items[0].reason, StockReason::Reassort);
        assert_eq!(history.items[0].quantity, 5);
    }

    #[test]
    fn reassort_batch_rolls_back_on_unknown_article() {
        let svc = service();
        let article = svc.create_article(new_article("Selle", 1), Utc::now()).unwrap();

        let err = svc
            .reassort(
                vec![
                    Reassort { article_id: article.id_typed(), quantity: 4 },
                    Reassort { article_id: ArticleId::new(), quantity: 2 },
                ],
                Utc::now(),
            )
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(svc.get_article(article.id_typed()).unwrap().quantity(), 1);
    }

    #[test]
    fn reassort_rejects_non_positive_quantities_up_front() {
        let svc = service();
        let article = svc.create_article(new_article("Selle", 1), Utc::now()).unwrap();
        let err = svc
            .reassort(
                vec![Reassort { article_id: article.id_typed(), quantity: 0 }],
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn repair_takes_one_unit() {
        let svc = service();
        let article = svc.create_article(new_article("Roue", 2), Utc::now()).unwrap();

        let entry = svc.send_for_repair(article.id_typed(), Utc::now()).unwrap();

        assert_eq!(entry.quantity, -1);
        assert_eq!(entry.reason, StockReason::Repair);
        assert_eq!(svc.get_article(article.id_typed()).unwrap().quantity(), 1);
    }

    #[test]
    fn repaired_article_is_under_repair_until_made_available_again() {
        let svc = service();
        let id = svc.create_article(new_article("Roue", 2), Utc::now()).unwrap().id_typed();
        assert_eq!(svc.get_article(id).unwrap().status(), ArticleStatus::Available);

        svc.send_for_repair(id, Utc::now()).unwrap();
        assert_eq!(svc.get_article(id).unwrap().status(), ArticleStatus::UnderRepair);

        let article = svc
            .update_article(
                id,
                ArticleUpdate {
                    name: "Roue".to_string(),
                    sale_price: Some(1200),
                    status: Some(ArticleStatus::Available),
                },
            )
            .unwrap();
        assert_eq!(article.status(), ArticleStatus::Available);
        assert_eq!(article.quantity(), 1);
    }

    #[test]
    fn history_of_unknown_article_is_not_found() {
        let err = service().history(ArticleId::new(), None, None).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
