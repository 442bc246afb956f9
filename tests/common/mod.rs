#![allow(dead_code)]

use campus_issues::services::notification::NotificationDispatcher;
use reqwest::Client;
use sea_orm::{ConnectOptions, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = campus_issues::config::jwt::JwtConfig::from_env().unwrap();
        let _ = campus_issues::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

/// Every app gets its own in-memory SQLite database. A single pooled
/// connection keeps the database alive for the lifetime of the app.
pub async fn spawn_app() -> TestApp {
    init_env();

    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(opt)
        .await
        .expect("Failed to open in-memory database");

    campus_issues::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(campus_issues::routes::create_routes())
        .layer(axum::middleware::from_fn(
            campus_issues::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(NotificationDispatcher::default()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

/// Register an account and return (user_id, token).
pub async fn create_test_user(app: &TestApp, role: &str, department: Option<&str>) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let college_id = format!("{}-{}", role, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "collegeId": college_id,
            "password": "secret123",
            "name": format!("{} {}", role, counter),
            "role": role,
            "department": department,
            "email": format!("{}@campus.test", college_id),
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse register response");
    assert!(
        body["success"].as_bool().unwrap_or(false),
        "Failed to register '{college_id}': status={status}, body={body}"
    );

    let user_id = body["data"]["user"]["id"]
        .as_i64()
        .expect("Response missing user id") as i32;
    let token = body["data"]["token"]
        .as_str()
        .expect("Response missing token")
        .to_string();
    (user_id, token)
}

/// Submit a report as `token` and return its id.
pub async fn submit_report(app: &TestApp, token: &str, category: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .json(&json!({
            "title": format!("Broken {category} fixture"),
            "description": "Reported during the evening round",
            "category": category,
            "location": "Block C, ground floor",
        }))
        .send()
        .await
        .expect("Failed to submit report");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse report response");
    assert_eq!(status, 200, "submit failed: {body}");
    body["data"]["id"].as_i64().expect("Report response missing id") as i32
}

pub async fn verify(app: &TestApp, token: &str, report_id: i32, decision: &str) -> reqwest::Response {
    app.client
        .put(app.url(&format!("/reports/{report_id}/verify")))
        .bearer_auth(token)
        .json(&json!({ "status": decision }))
        .send()
        .await
        .expect("Failed to send verify request")
}

pub async fn advance(
    app: &TestApp,
    token: &str,
    report_id: i32,
    status: &str,
    closure_image_url: Option<&str>,
) -> reqwest::Response {
    app.client
        .put(app.url(&format!("/reports/{report_id}/status")))
        .bearer_auth(token)
        .json(&json!({ "status": status, "closureImageUrl": closure_image_url }))
        .send()
        .await
        .expect("Failed to send status request")
}

pub async fn get_report(app: &TestApp, token: &str, report_id: i32) -> reqwest::Response {
    app.client
        .get(app.url(&format!("/reports/{report_id}")))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to fetch report")
}
