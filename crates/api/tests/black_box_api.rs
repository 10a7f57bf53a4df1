use std::sync::Arc;

use catalog_api::app::services::AppServices;
use catalog_infra::config::DatabaseConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over a private in-memory SQLite database, bound to an ephemeral port.
    async fn spawn() -> Self {
        let services = catalog_api::app::services::build_services(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .expect("failed to open in-memory database");
        Self::spawn_with(services).await
    }

    async fn spawn_with(services: AppServices) -> Self {
        let app = catalog_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn send(&self, cmd: &str, data: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}/rpc", self.base_url))
            .json(&json!({ "cmd": cmd, "data": data }))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_lifecycle_create_update_delete() {
    let srv = TestServer::spawn().await;

    let (status, created) = srv
        .send("create_product", json!({"name": "Laptop", "price": 999.99}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["id"], 1);
    assert_eq!(created["available"], true);
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let (status, updated) = srv
        .send("update_product", json!({"id": 1, "price": 899.99}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Laptop");
    assert_eq!(updated["price"], 899.99);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert!(updated["updatedAt"].is_string());

    let (status, removed) = srv.send("delete_product", json!({"id": 1})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["available"], false);

    let (status, body) = srv.send("find_one_product", json!({"id": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "product with id #1 not found");

    let (status, _) = srv.send("delete_product", json!({"id": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn find_all_pages_through_available_products() {
    let srv = TestServer::spawn().await;
    for i in 0..12 {
        let (status, _) = srv
            .send("create_product", json!({"name": format!("Product {i}"), "price": 10}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, page) = srv
        .send("find_all_products", json!({"page": 2, "limit": 10}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["meta"], json!({"page": 2, "total": 12, "lastPage": 2}));

    let (status, defaults) = srv.send("find_all_products", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults["data"].as_array().unwrap().len(), 10);
    assert_eq!(defaults["meta"]["page"], 1);
}

#[tokio::test]
async fn invalid_payloads_are_rejected_before_any_write() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .send("create_product", json!({"name": "", "price": 10}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv
        .send("create_product", json!({"name": "X", "price": -1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv
        .send("find_all_products", json!({"page": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = srv.send("find_all_products", json!({})).await;
    assert_eq!(page["meta"]["total"], 0);
}

#[tokio::test]
async fn unknown_pattern_and_malformed_envelope_are_bad_requests() {
    let srv = TestServer::spawn_with(AppServices::in_memory()).await;

    let (status, body) = srv.send("drop_products", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_pattern");

    let res = srv
        .client
        .post(format!("{}/rpc", srv.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_message");
}

#[tokio::test]
async fn validate_products_checks_a_batch() {
    let srv = TestServer::spawn().await;
    for name in ["A", "B"] {
        srv.send("create_product", json!({"name": name, "price": 1.5})).await;
    }

    let (status, found) = srv.send("validate_products", json!([2, 1, 2])).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);

    let (status, body) = srv.send("validate_products", json!([1, 9])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("9"));
}

#[tokio::test]
async fn wide_prices_round_trip_exactly() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(format!("{}/rpc", srv.base_url))
        .header("content-type", "application/json")
        .body(r#"{"cmd": "create_product", "data": {"name": "Server rack", "price": 12345678901234567.89}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, _) = srv.send("find_one_product", json!({"id": 1})).await;
    assert_eq!(status, StatusCode::OK);

    let text = srv
        .client
        .post(format!("{}/rpc", srv.base_url))
        .json(&json!({"cmd": "find_one_product", "data": {"id": 1}}))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains(r#""price":12345678901234567.89"#), "{text}");
}
