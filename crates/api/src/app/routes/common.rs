use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use membership_auth::Permission;
use membership_core::{DomainError, Page};

use crate::app::errors;
use crate::context::PrincipalContext;

/// `?offset=<page>&limit=<size>`; `offset` is a 1-based page number.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Authorize the request principal, or produce the 403 response.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), Response> {
    crate::authz::authorize_request(principal, permission).map_err(errors::forbidden)
}

pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::invalid_id)
}

/// `X-Total-Count` and RFC 5988 `Link` headers for a page served at `path`.
pub fn pagination_headers<T>(page: &Page<T>, path: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(total) = HeaderValue::from_str(&page.total.to_string()) {
        headers.insert("X-Total-Count", total);
    }

    let link = |p: u32, rel: &str| format!("<{path}?offset={p}&limit={}>; rel=\"{rel}\"", page.per_page);
    let last = page.page_count();
    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(link(page.page + 1, "next"));
    }
    if page.page > 1 {
        links.push(link((page.page - 1).min(last), "prev"));
    }
    links.push(link(last, "last"));
    links.push(link(1, "first"));

    if let Ok(value) = HeaderValue::from_str(&links.join(",")) {
        headers.insert(axum::http::header::LINK, value);
    }
    headers
}

/// 200 with the page items as a JSON array plus pagination headers.
pub fn paged_response<T, U>(page: Page<T>, path: &str, map: impl FnMut(T) -> U) -> Response
where
    U: Serialize,
{
    let headers = pagination_headers(&page, path);
    let page = page.map(map);
    (StatusCode::OK, headers, Json(page.items)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use membership_core::PageRequest;

    #[test]
    fn middle_page_links_every_direction() {
        let page = Page::from_sorted((0..45).collect::<Vec<_>>(), PageRequest::new(Some(2), Some(20)));
        let headers = pagination_headers(&page, "/sales/history");

        assert_eq!(headers["X-Total-Count"], "45");
        let link = headers[axum::http::header::LINK].to_str().unwrap();
        assert!(link.contains("</sales/history?offset=3&limit=20>; rel=\"next\""));
        assert!(link.contains("</sales/history?offset=1&limit=20>; rel=\"prev\""));
        assert!(link.contains("</sales/history?offset=3&limit=20>; rel=\"last\""));
        assert!(link.contains("</sales/history?offset=1&limit=20>; rel=\"first\""));
    }

    #[test]
    fn single_page_has_no_next_or_prev() {
        let page = Page::from_sorted(vec![1, 2], PageRequest::default());
        let headers = pagination_headers(&page, "/adherents");
        let link = headers[axum::http::header::LINK].to_str().unwrap();
        assert!(!link.contains("next"));
        assert!(!link.contains("prev"));
    }
}
