use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use membership_auth::permissions;
use membership_core::SaleId;
use membership_sales::SaleDto;

use crate::app::dto::SaleRequest;
use crate::app::errors;
use crate::app::routes::common::{PageQuery, paged_response, parse_id, require};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_sale))
        .route("/history", get(sales_history))
        .route("/temporary", get(temporary_sales))
        .route("/statistics", get(sales_statistics))
        .route("/:id", get(get_sale).put(update_sale).delete(delete_sale))
}

pub async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<SaleRequest>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::SALES_WRITE) {
        return resp;
    }

    match services.sales.new_sale(body.into_new_sale(Utc::now())) {
        Ok(sale) => (StatusCode::CREATED, Json(SaleDto::from(&sale))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Merge the terminal's view of the sale. Only the stock difference this
/// request causes is applied.
pub async fn update_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<SaleRequest>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::SALES_WRITE) {
        return resp;
    }
    let id: SaleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sales.update(body.into_update(id, Utc::now())) {
        Ok(sale) => (StatusCode::OK, Json(SaleDto::from(&sale))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::SALES_WRITE) {
        return resp;
    }
    let id: SaleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sales.delete(id, Utc::now()) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::SALES_READ) {
        return resp;
    }
    let id: SaleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sales.get(id) {
        Ok(sale) => (StatusCode::OK, Json(SaleDto::from(&sale))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn sales_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(page): Query<PageQuery>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::SALES_READ) {
        return resp;
    }

    match services.sales.history(page.offset, page.limit) {
        Ok(page) => paged_response(page, "/sales/history", |s| SaleDto::from(&s)),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn temporary_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::SALES_READ) {
        return resp;
    }

    match services.sales.temporary_sales() {
        Ok(sales) => {
            let items = sales.iter().map(SaleDto::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Monthly figures; defaults to the last twelve months.
pub async fn sales_statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(range): Query<StatisticsQuery>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::STATISTICS_READ) {
        return resp;
    }

    let to = range.to.unwrap_or_else(Utc::now);
    let from = range.from.unwrap_or(to - Duration::days(365));
    match services.sales.statistics(from, to) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
