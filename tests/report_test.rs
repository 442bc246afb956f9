mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn submit_routes_report_to_category_department() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "user", None).await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Street light out",
            "description": "Dark stretch near the library",
            "category": "electric",
            "location": "Library road",
            "imageUrl": "https://img.campus.test/1.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["status"], "pending");
    assert_eq!(data["department"], "electric");
    assert_eq!(data["category"], "electric");
    assert_eq!(data["reporterId"], user_id);
    assert_eq!(data["maintainerId"], Value::Null);
    assert_eq!(data["title"], "Street light out");
    assert_eq!(data["imageUrl"], "https://img.campus.test/1.jpg");
    assert!(data.get("originalReportId").is_none());
}

#[tokio::test]
async fn free_text_is_stored_verbatim() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "user", None).await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "  Lab 3 & 4 flooded ",
            "description": "water < 2cm, \"rising\"",
            "category": "water",
            "location": "A&B <east wing>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let report = body["data"]["id"].as_i64().unwrap() as i32;

    let resp = common::get_report(&app, &token, report).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Lab 3 & 4 flooded");
    assert_eq!(body["data"]["description"], "water < 2cm, \"rising\"");
    assert_eq!(body["data"]["location"], "A&B <east wing>");
}

#[tokio::test]
async fn over_long_fields_are_rejected() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "user", None).await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "x".repeat(201),
            "description": "Too long a title",
            "category": "road",
            "location": "Main gate"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("title"), "{body}");

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Pothole",
            "description": "Deep one",
            "category": "road",
            "location": "Main gate",
            "imageUrl": format!("https://img.campus.test/{}", "p".repeat(500))
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "user", None).await;

    // Wrong-typed field
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Pothole",
            "description": "Deep one",
            "category": 5,
            "location": "Main gate"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string(), "{body}");

    // Not JSON at all
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string(), "{body}");

    // Non-numeric id
    let resp = app
        .client
        .get(app.url("/reports/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string(), "{body}");

    let resp = app
        .client
        .put(app.url("/reports/abc/status"))
        .bearer_auth(&token)
        .json(&json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn submit_rejects_missing_fields_and_unknown_category() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "user", None).await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({ "title": "No description", "category": "water", "location": "Gate 2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("description"));

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Book missing",
            "description": "Shelf 4",
            "category": "library",
            "location": "Reading room"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn users_only_see_their_own_reports() {
    let app = common::spawn_app().await;
    let (alice_id, alice) = common::create_test_user(&app, "user", None).await;
    let (bob_id, bob) = common::create_test_user(&app, "user", None).await;

    let alice_report = common::submit_report(&app, &alice, "water").await;
    common::submit_report(&app, &bob, "road").await;

    let resp = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let reports = body["data"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], alice_report);

    let resp = common::get_report(&app, &bob, alice_report).await;
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url(&format!("/reports/user/{alice_id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/reports/user/{bob_id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

async fn list(app: &common::TestApp, token: &str, query: &str) -> (reqwest::StatusCode, Value) {
    let resp = app
        .client
        .get(app.url(&format!("/reports{query}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn staff_listings_follow_role_defaults() {
    let app = common::spawn_app().await;
    let (_u, user) = common::create_test_user(&app, "user", None).await;
    let (_h, head) = common::create_test_user(&app, "field_head", Some("water")).await;
    let (_m, maintainer) = common::create_test_user(&app, "maintainer", Some("water")).await;

    let pending = common::submit_report(&app, &user, "water").await;
    let verified = common::submit_report(&app, &user, "water").await;
    common::submit_report(&app, &user, "road").await;
    assert_eq!(common::verify(&app, &head, verified, "verified").await.status(), 200);

    // Field head: pending queue of their own department
    let (_, body) = list(&app, &head, "").await;
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![pending as i64]);

    let (_, body) = list(&app, &head, "?view=verify_section&status=resolved").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Maintainer: work queue excludes pending
    let (_, body) = list(&app, &maintainer, "").await;
    let reports = body["data"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], verified);

    // Explicit foreign department is refused
    let (status, _) = list(&app, &maintainer, "?department=road").await;
    assert_eq!(status, 403);

    // Fake never appears in the live listing
    let (status, body) = list(&app, &user, "?status=fake").await;
    assert_eq!(status, 200);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn staff_can_view_reports_of_their_department_only() {
    let app = common::spawn_app().await;
    let (_u, user) = common::create_test_user(&app, "user", None).await;
    let (_m, water) = common::create_test_user(&app, "maintainer", Some("water")).await;
    let (_r, road) = common::create_test_user(&app, "maintainer", Some("road")).await;

    let report = common::submit_report(&app, &user, "water").await;

    assert_eq!(common::get_report(&app, &water, report).await.status(), 200);
    assert_eq!(common::get_report(&app, &road, report).await.status(), 403);
    assert_eq!(common::get_report(&app, &user, 4242).await.status(), 404);
}
