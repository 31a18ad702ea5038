use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use membership_api::config::Config;
use membership_auth::{JwtClaims, Role};
use membership_core::UserId;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        let mut config = Config::default();
        config.auth.jwt_secret = jwt_secret.to_string();

        // Build app (same router as prod), but bind to an ephemeral port.
        let app = membership_api::app::build_app(&config).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        login: "caisse".to_string(),
        roles,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

const SECRET: &str = "test-secret";

async fn post_json(client: &reqwest::Client, url: String, token: &str, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).bearer_auth(token).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn put_json(client: &reqwest::Client, url: String, token: &str, body: Value) -> (StatusCode, Value) {
    let res = client.put(url).bearer_auth(token).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn get_json(client: &reqwest::Client, url: String, token: &str) -> (StatusCode, Value) {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

/// A member and an article with `quantity` units; returns their ids.
async fn seed(srv: &TestServer, client: &reqwest::Client, token: &str, quantity: i64) -> (String, String) {
    let (status, adherent) = post_json(
        client,
        srv.url("/adherents"),
        token,
        json!({ "firstName": "Camille", "lastName": "Roux" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, article) = post_json(
        client,
        srv.url("/articles"),
        token,
        json!({ "name": "Pneu", "salePrice": 1000, "quantity": quantity }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(article["quantity"], quantity);

    (
        adherent["id"].as_str().unwrap().to_string(),
        article["id"].as_str().unwrap().to_string(),
    )
}

async fn article_quantity(srv: &TestServer, client: &reqwest::Client, token: &str, id: &str) -> i64 {
    let (status, article) = get_json(client, srv.url(&format!("/articles/{id}")), token).await;
    assert_eq!(status, StatusCode::OK);
    article["quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(SECRET).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(SECRET).await;

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("another-secret", vec![Role::ADMIN]);
    let res = client.get(srv.url("/whoami")).bearer_auth(forged).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::WORKSHOP_MANAGER]);

    let (status, body) = get_json(&reqwest::Client::new(), srv.url("/whoami"), &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "caisse");
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "workshop_manager"));
}

#[tokio::test]
async fn sale_update_moves_stock_by_the_difference_only() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (adherent, article) = seed(&srv, &client, &token, 22).await;

    let (status, sale) = post_json(
        &client,
        srv.url("/sales"),
        &token,
        json!({
            "adherentId": adherent,
            "paymentType": "cash",
            "soldItems": [{ "articleId": article, "quantity": 2, "price": 10 }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(article_quantity(&srv, &client, &token, &article).await, 20);

    let sale_id = sale["id"].as_str().unwrap();
    let line_id = sale["soldItems"][0]["id"].as_str().unwrap();
    let (status, updated) = put_json(
        &client,
        srv.url(&format!("/sales/{sale_id}")),
        &token,
        json!({
            "version": sale["version"],
            "adherentId": adherent,
            "paymentType": "cash",
            "soldItems": [{ "id": line_id, "articleId": article, "quantity": 5, "price": 10 }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["soldItems"][0]["quantity"], 5);
    assert_eq!(article_quantity(&srv, &client, &token, &article).await, 17);

    let (status, ledger) = get_json(&client, srv.url(&format!("/articles/{article}/history")), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger.as_array().unwrap().len(), 3);
    assert_eq!(ledger[0]["reason"], "SALE");
    assert_eq!(ledger[0]["quantity"], -3);
}

#[tokio::test]
async fn overflowing_sale_is_a_bad_request_and_the_server_keeps_serving() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (adherent, article) = seed(&srv, &client, &token, 22).await;

    let (status, body) = post_json(
        &client,
        srv.url("/sales"),
        &token,
        json!({
            "adherentId": adherent,
            "paymentType": "cash",
            "soldItems": [
                { "articleId": article, "quantity": i64::MAX, "price": 1 },
                { "articleId": article, "quantity": i64::MAX, "price": 1 }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(article_quantity(&srv, &client, &token, &article).await, 22);
}

#[tokio::test]
async fn repair_puts_an_article_under_repair_until_updated() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (_, article) = seed(&srv, &client, &token, 3).await;

    let (status, entry) = post_json(
        &client,
        srv.url(&format!("/articles/{article}/for-repairing")),
        &token,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["reason"], "REPAIR");

    let (_, repaired) = get_json(&client, srv.url(&format!("/articles/{article}")), &token).await;
    assert_eq!(repaired["status"], "UNDER_REPAIR");
    assert_eq!(repaired["quantity"], 2);

    let (status, updated) = put_json(
        &client,
        srv.url(&format!("/articles/{article}")),
        &token,
        json!({ "name": "Pneu", "salePrice": 1000, "status": "AVAILABLE" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "AVAILABLE");
    assert_eq!(updated["quantity"], 2);
}

#[tokio::test]
async fn foreign_line_id_is_rejected_without_side_effects() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::USER]);
    let admin = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (adherent, article) = seed(&srv, &client, &admin, 10).await;

    let (_, sale) = post_json(
        &client,
        srv.url("/sales"),
        &token,
        json!({
            "adherentId": adherent,
            "paymentType": "card",
            "soldItems": [{ "articleId": article, "quantity": 1, "price": 10 }]
        }),
    )
    .await;
    let sale_id = sale["id"].as_str().unwrap();

    let (status, body) = put_json(
        &client,
        srv.url(&format!("/sales/{sale_id}")),
        &token,
        json!({
            "adherentId": adherent,
            "paymentType": "card",
            "soldItems": [
                { "articleId": article, "quantity": 4, "price": 10 },
                { "id": UserId::new().to_string(), "articleId": article, "quantity": 1, "price": 10 }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "lookup_error");
    assert_eq!(article_quantity(&srv, &client, &token, &article).await, 9);
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (adherent, article) = seed(&srv, &client, &token, 10).await;

    let (_, sale) = post_json(
        &client,
        srv.url("/sales"),
        &token,
        json!({ "adherentId": adherent, "paymentType": "cash", "soldItems": [] }),
    )
    .await;
    let sale_id = sale["id"].as_str().unwrap();
    let stale = json!({
        "version": sale["version"],
        "adherentId": adherent,
        "paymentType": "cash",
        "soldItems": [{ "articleId": article, "quantity": 1, "price": 10 }]
    });

    let (status, _) = put_json(&client, srv.url(&format!("/sales/{sale_id}")), &token, stale.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = put_json(&client, srv.url(&format!("/sales/{sale_id}")), &token, stale).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(article_quantity(&srv, &client, &token, &article).await, 9);
}

#[tokio::test]
async fn history_is_paged_with_link_headers() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (adherent, article) = seed(&srv, &client, &token, 10).await;

    for finished in [true, true, true, false] {
        let (status, _) = post_json(
            &client,
            srv.url("/sales"),
            &token,
            json!({
                "adherentId": adherent,
                "paymentType": "cash",
                "finished": finished,
                "soldItems": [{ "articleId": article, "quantity": 1, "price": 10 }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let res = client
        .get(srv.url("/sales/history?offset=1&limit=2"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-total-count"], "3");
    let link = res.headers()["link"].to_str().unwrap().to_string();
    assert!(link.contains("offset=2&limit=2>; rel=\"next\""));
    let page: Value = res.json().await.unwrap();
    assert_eq!(page.as_array().unwrap().len(), 2);

    let (_, open) = get_json(&client, srv.url("/sales/temporary"), &token).await;
    assert_eq!(open.as_array().unwrap().len(), 1);
    assert_eq!(open[0]["finished"], false);
}

#[tokio::test]
async fn till_user_cannot_restock_or_export() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::USER]);
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/articles/reassort"),
        &token,
        json!([{ "articleId": UserId::new().to_string(), "quantity": 3 }]),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = post_json(&client, srv.url("/adherents/export"), &token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn export_returns_a_csv_attachment() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    seed(&srv, &client, &token, 1).await;

    let res = client
        .post(srv.url("/adherents/export"))
        .bearer_auth(&token)
        .json(&json!({ "format": "csv", "properties": { "nom": true, "prenom": true, "ville": false } }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    assert!(res.headers()["content-disposition"].to_str().unwrap().contains("attachment"));
    let body = res.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines, vec!["\"Nom\";\"Prénom\"", "\"Roux\";\"Camille\""]);
}

#[tokio::test]
async fn open_sale_changes_are_pushed_over_sse() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, vec![Role::ADMIN]);
    let client = reqwest::Client::new();
    let (adherent, article) = seed(&srv, &client, &token, 5).await;

    let mut stream = client.get(srv.url("/stream")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(stream.status(), StatusCode::OK);

    let (status, _) = post_json(
        &client,
        srv.url("/sales"),
        &token,
        json!({
            "adherentId": adherent,
            "paymentType": "cash",
            "soldItems": [{ "articleId": article, "quantity": 1, "price": 10 }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let received = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let mut buffer = String::new();
        while let Some(chunk) = stream.chunk().await.unwrap() {
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            if buffer.contains("event: temporarySales") {
                break;
            }
        }
        buffer
    })
    .await
    .expect("no sale notification within timeout");

    assert!(received.contains("event: temporarySales"));
    assert!(received.contains(&article));
}
