use axum::{Router, routing::get};

pub mod adherents;
pub mod articles;
pub mod common;
pub mod sales;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/sales", sales::router())
        .nest("/articles", articles::router())
        .nest("/adherents", adherents::router())
}
