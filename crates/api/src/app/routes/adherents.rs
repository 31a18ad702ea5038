use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use membership_adherents::{AdherentInput, NewAdhesion};
use membership_auth::permissions;
use membership_core::AdherentId;

use crate::app::dto::ExportRequestBody;
use crate::app::errors;
use crate::app::routes::common::{PageQuery, paged_response, parse_id, require};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_adherent).get(list_adherents))
        .route("/search", get(search_adherents))
        .route("/export", post(export_adherents))
        .route(
            "/:id",
            get(get_adherent).put(update_adherent).delete(delete_adherent),
        )
        .route("/:id/adhesions", post(add_adhesion))
}

pub async fn create_adherent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<AdherentInput>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_WRITE) {
        return resp;
    }

    match services.adherents.create(body) {
        Ok(adherent) => (StatusCode::CREATED, Json(adherent)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_adherents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(page): Query<PageQuery>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_READ) {
        return resp;
    }

    match services.adherents.list(page.offset, page.limit) {
        Ok(page) => paged_response(page, "/adherents", |a| a),
        Err(e) => errors::service_error_to_response(e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub criteria: String,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Case-insensitive search on first and last name.
pub async fn search_adherents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<SearchQuery>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_READ) {
        return resp;
    }

    match services
        .adherents
        .search(&query.criteria, query.offset, query.limit)
    {
        Ok(page) => paged_response(page, "/adherents/search", |a| a),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_adherent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_READ) {
        return resp;
    }
    let id: AdherentId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.adherents.get(id) {
        Ok(adherent) => (StatusCode::OK, Json(adherent)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_adherent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<AdherentInput>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_WRITE) {
        return resp;
    }
    let id: AdherentId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.adherents.update(id, body) {
        Ok(adherent) => (StatusCode::OK, Json(adherent)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_adherent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_DELETE) {
        return resp;
    }
    let id: AdherentId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.adherents.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_adhesion(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<NewAdhesion>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_WRITE) {
        return resp;
    }
    let id: AdherentId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.adherents.add_adhesion(id, body) {
        Ok(adherent) => (StatusCode::CREATED, Json(adherent)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Download the member list as CSV or JSON.
pub async fn export_adherents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ExportRequestBody>,
) -> Response {
    if let Err(resp) = require(&principal, &permissions::ADHERENTS_EXPORT) {
        return resp;
    }

    let request = match body.into_request() {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };
    match services.adherents.export(&request, Utc::now().date_naive()) {
        Ok(exported) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, exported.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", exported.file_name),
                ),
            ],
            exported.body,
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
