use tracing::{debug, warn};

use membership_core::StockHistoryId;
use membership_stock::{StockHistory, StockQuantityChanged, StockReason};

use crate::error::ServiceError;
use crate::store::Repositories;

/// Applies a [`StockQuantityChanged`] to its article and books the ledger entry.
///
/// Each call applies the delta exactly once; there is no deduplication, so
/// callers must emit one event per logical change.
#[derive(Debug, Default, Clone, Copy)]
pub struct StockQuantityListener;

impl StockQuantityListener {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(
        &self,
        repos: &mut dyn Repositories,
        event: &StockQuantityChanged,
    ) -> Result<StockHistory, ServiceError> {
        let mut article = repos
            .find_article(event.article_id)?
            .ok_or_else(|| ServiceError::not_found(format!("article {}", event.article_id)))?;

        let entry = article.apply_stock_change(event, StockHistoryId::new())?;

        if event.reason == StockReason::Sale {
            if let Some(price) = event.price {
                if event.delta < 0 && article.is_sold_below_price(price) {
                    warn!(
                        article_id = %article.id_typed(),
                        price,
                        sale_price = ?article.sale_price(),
                        "article sold below its sale price"
                    );
                }
            }
        }
        if article.quantity() < 0 {
            warn!(
                article_id = %article.id_typed(),
                quantity = article.quantity(),
                "stock went negative"
            );
        }

        debug!(
            article_id = %article.id_typed(),
            delta = event.delta,
            reason = ?event.reason,
            quantity = article.quantity(),
            "stock quantity changed"
        );

        repos.save_article(article)?;
        repos.append_stock_history(entry.clone())?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, Store};
    use chrono::Utc;
    use membership_core::ArticleId;
    use membership_stock::{Article, NewArticle};

    fn seeded_store(quantity: i64) -> (InMemoryStore, ArticleId) {
        let store = InMemoryStore::new();
        let article = Article::create(
            ArticleId::new(),
            NewArticle {
                name: "Patin de frein".to_string(),
                sale_price: Some(300),
                initial_quantity: 0,
            },
        )
        .unwrap();
        let id = article.id_typed();
        store
            .transaction(|repos| {
                repos.save_article(article)?;
                StockQuantityListener.apply(
                    repos,
                    &StockQuantityChanged::from_reassort(id, quantity, Utc::now()),
                )
            })
            .unwrap();
        (store, id)
    }

    #[test]
    fn applies_delta_and_records_history() {
        let (store, id) = seeded_store(10);

        let entry = store
            .transaction(|repos| {
                StockQuantityListener.apply(repos, &StockQuantityChanged::from_sale(id, 3, 300, Utc::now()))
            })
            .unwrap();

        assert_eq!(entry.quantity, -3);
        assert_eq!(entry.reason, StockReason::Sale);

        let (article, history) = store
            .read(|repos| {
                let article = repos.find_article(id)?;
                let history = repos.stock_history(id, Default::default())?;
                Ok::<_, ServiceError>((article, history))
            })
            .unwrap();
        assert_eq!(article.unwrap().quantity(), 7);
        assert_eq!(history.total, 2);
        assert_eq!(history.items[0].quantity, -3);
    }

    #[test]
    fn unknown_article_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .transaction(|repos| {
                StockQuantityListener.apply(
                    repos,
                    &StockQuantityChanged::for_repair(ArticleId::new(), 1, Utc::now()),
                )
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
