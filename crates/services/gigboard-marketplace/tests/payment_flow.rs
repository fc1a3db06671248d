use axum::{routing::post, Json, Router};
use gigboard_marketplace::{create_app, InMemoryStore, MarketplaceStore, ServiceConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

/// Stand-in for the payment processor's session-create endpoint.
async fn spawn_mock_processor() -> SocketAddr {
    let router = Router::new().route(
        "/v1/checkout/sessions",
        post(|| async { Json(json!({ "id": "cs_test_abc123" })) }),
    );
    let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap())
        .serve(router.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn test_config(processor_addr: Option<SocketAddr>, secret_key: Option<&str>) -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        data_dir: None,
        processor_api_base: processor_addr
            .map(|a| format!("http://{}", a))
            .unwrap_or_else(|| "http://127.0.0.1:1".to_string()),
        processor_secret_key: secret_key.map(|s| s.to_string()),
        public_origin: "http://localhost:3000".to_string(),
        currency: "inr".to_string(),
        development: false,
        log_level: None,
    }
}

async fn spawn_app(config: ServiceConfig) -> SocketAddr {
    let store: Arc<dyn MarketplaceStore> = Arc::new(InMemoryStore::new());
    let app = create_app(store, Arc::new(config));
    let server =
        axum::Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

#[tokio::test]
async fn checkout_session_is_created_against_the_processor() {
    let processor = spawn_mock_processor().await;
    let app = spawn_app(test_config(Some(processor), Some("sk_test_secret"))).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/payments/checkout-session", app))
        .json(&json!({ "amount": 45000, "project_id": "p1", "bid_id": "b1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["session_id"], "cs_test_abc123");
}

#[tokio::test]
async fn checkout_session_with_missing_fields_is_rejected() {
    let processor = spawn_mock_processor().await;
    let app = spawn_app(test_config(Some(processor), Some("sk_test_secret"))).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/payments/checkout-session", app))
        .json(&json!({ "amount": 45000 }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("amount"));
}

#[tokio::test]
async fn checkout_session_without_credentials_is_a_server_error() {
    let app = spawn_app(test_config(None, None)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/payments/checkout-session", app))
        .json(&json!({ "amount": 45000, "project_id": "p1", "bid_id": "b1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("secret key"));
}

/// Drives the full client-side flow over HTTP: roster, project, bid, accept,
/// then payment confirmation, which must credit the freelancer exactly once.
#[tokio::test]
async fn payment_confirmation_marks_paid_and_credits_earnings_once() {
    let app = spawn_app(test_config(None, None)).await;
    let client = reqwest::Client::new();
    let base = format!("http://{}", app);

    let resp = client
        .post(format!("{}/freelancers", base))
        .json(&json!({ "id": "f1", "name": "Jane Doe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let project: Value = client
        .post(format!("{}/projects", base))
        .json(&json!({
            "name": "Landing page",
            "description": "Marketing refresh",
            "budget": 500,
            "timeline_days": 10,
            "skills": ["react"],
            "client_id": "c1"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let project_id = project["id"].as_str().unwrap().to_string();

    let bid: Value = client
        .post(format!("{}/projects/{}/bids", base, project_id))
        .json(&json!({
            "freelancer_id": "f1",
            "amount": 450,
            "timeline_days": 9,
            "proposal": "I can do this"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let bid_id = bid["id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/bids/{}/accept", base, bid_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{}/payments/confirm", base))
        .json(&json!({ "project_id": project_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let project: Value = client
        .get(format!("{}/projects/{}", base, project_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(project["payment_status"], "paid");
    assert_eq!(project["status"], "in_progress");

    let freelancer: Value = client
        .get(format!("{}/freelancers/f1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(freelancer["total_earnings"], 450);

    // Confirming again is a no-op; earnings are not double counted.
    let resp = client
        .post(format!("{}/payments/confirm", base))
        .json(&json!({ "project_id": project_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let freelancer: Value = client
        .get(format!("{}/freelancers/f1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(freelancer["total_earnings"], 450);
}

#[tokio::test]
async fn accepting_a_second_bid_for_the_same_project_conflicts() {
    let app = spawn_app(test_config(None, None)).await;
    let client = reqwest::Client::new();
    let base = format!("http://{}", app);

    let project: Value = client
        .post(format!("{}/projects", base))
        .json(&json!({
            "name": "API build-out",
            "description": "REST endpoints",
            "budget": 800,
            "timeline_days": 15,
            "skills": ["rust"],
            "client_id": "c1"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let project_id = project["id"].as_str().unwrap().to_string();

    let mut bid_ids = Vec::new();
    for freelancer in ["f1", "f2"] {
        let bid: Value = client
            .post(format!("{}/projects/{}/bids", base, project_id))
            .json(&json!({
                "freelancer_id": freelancer,
                "amount": 700,
                "timeline_days": 12,
                "proposal": "offer"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        bid_ids.push(bid["id"].as_str().unwrap().to_string());
    }

    let resp = client
        .post(format!("{}/bids/{}/accept", base, bid_ids[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{}/bids/{}/accept", base, bid_ids[1]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Accepting the same bid again stays fine
    let resp = client
        .post(format!("{}/bids/{}/accept", base, bid_ids[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
