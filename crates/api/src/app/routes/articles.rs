use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use membership_auth::permissions;
use membership_core::ArticleId;
use membership_stock::{ArticleUpdate, Reassort};

use crate::app::dto::{ArticleDto, ArticleRequest, ReassortRequest, StockHistoryDto};
use crate::app::errors;
use crate::app::routes::common::{PageQuery, paged_response, parse_id, require};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_article).get(list_articles))
        .route("/reassort", post(reassort))
        .route("/:id", get(get_article).put(update_article))
        .route("/:id/for-repairing", post(send_for_repair))
        .route("/:id/history", get(article_history))
}

pub async fn create_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ArticleRequest>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ARTICLES_WRITE) {
        return resp;
    }

    match services.stock.create_article(body.into(), Utc::now()) {
        Ok(article) => (StatusCode::CREATED, Json(ArticleDto::from(&article))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_articles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ARTICLES_READ) {
        return resp;
    }

    match services.stock.list_articles() {
        Ok(articles) => {
            let items = articles.iter().map(ArticleDto::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ARTICLES_READ) {
        return resp;
    }
    let id: ArticleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.get_article(id) {
        Ok(article) => (StatusCode::OK, Json(ArticleDto::from(&article))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Catalogue fields and status only; the quantity moves through reassort, repair and sales.
pub async fn update_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ArticleRequest>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ARTICLES_WRITE) {
        return resp;
    }
    let id: ArticleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let update = ArticleUpdate {
        name: body.name,
        sale_price: body.sale_price,
        status: body.status,
    };
    match services.stock.update_article(id, update) {
        Ok(article) => (StatusCode::OK, Json(ArticleDto::from(&article))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reassort(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Vec<ReassortRequest>>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::STOCK_REASSORT) {
        return resp;
    }

    let lines = body.into_iter().map(Reassort::from).collect();
    match services.stock.reassort(lines, Utc::now()) {
        Ok(entries) => {
            let items = entries.into_iter().map(StockHistoryDto::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn send_for_repair(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::STOCK_REPAIR) {
        return resp;
    }
    let id: ArticleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.send_for_repair(id, Utc::now()) {
        Ok(entry) => (StatusCode::OK, Json(StockHistoryDto::from(entry))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn article_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ARTICLES_READ) {
        return resp;
    }
    let article_id: ArticleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.history(article_id, page.offset, page.limit) {
        Ok(page) => paged_response(page, &format!("/articles/{id}/history"), StockHistoryDto::from),
        Err(e) => errors::service_error_to_response(e),
    }
}
