use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use vitrine_api::auth::{AppState, AppStateInner};
use vitrine_api::cache::CategoryCache;
use vitrine_api::mailer::Mailer;
use vitrine_db::Database;

fn test_app() -> Router {
    let mail_dir = std::env::temp_dir().join(format!("vitrine-mail-{}", uuid::Uuid::new_v4()));
    let mailer = Mailer::file(
        &mail_dir,
        "Vitrine <noreply@vitrine.local>".parse().unwrap(),
    )
    .unwrap();

    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".to_string(),
        base_url: "http://test.local".to_string(),
        categories: CategoryCache::new(Duration::from_secs(3600)),
        mailer,
    });
    vitrine_api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "password": "Secret$123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "Secret$123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_category(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/categories",
        Some(token),
        Some(json!({ "name": name, "description": "test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_product_in_a_category() {
    let app = test_app();
    let token = register_and_login(&app, "owner@example.com").await;
    let category_id = create_category(&app, &token, "Electronics").await;

    let (status, product) = send(
        &app,
        "POST",
        "/products",
        Some(&token),
        Some(json!({
            "name": "Smartphone",
            "description": "A phone",
            "image": null,
            "category_id": category_id,
            "price_per_unit": 300
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["is_published"], json!(false));
    assert_eq!(product["created_at"], product["updated_at"]);
    assert_eq!(product["category_id"].as_str().unwrap(), category_id);

    let (status, products) = send(&app, "GET", "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["name"], "Smartphone");
}

#[tokio::test]
async fn banned_words_are_rejected_and_nothing_is_written() {
    let app = test_app();
    let token = register_and_login(&app, "owner@example.com").await;
    let category_id = create_category(&app, &token, "Electronics").await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(&token),
        Some(json!({
            "name": "Cheapest phone ever",
            "description": "great deal",
            "image": null,
            "category_id": category_id,
            "price_per_unit": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");
    assert!(body["error"].as_str().unwrap().contains("cheap"));

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(&token),
        Some(json!({
            "name": "Phone",
            "description": "better than any CASINO",
            "image": null,
            "category_id": category_id,
            "price_per_unit": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "description");
    assert!(body["error"].as_str().unwrap().contains("casino"));

    let (_, products) = send(&app, "GET", "/products", None, None).await;
    assert_eq!(products.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn only_the_owner_may_update_or_delete() {
    let app = test_app();
    let owner = register_and_login(&app, "owner@example.com").await;
    let intruder = register_and_login(&app, "intruder@example.com").await;
    let category_id = create_category(&app, &owner, "Electronics").await;

    let (_, product) = send(
        &app,
        "POST",
        "/products",
        Some(&owner),
        Some(json!({
            "name": "Smartphone",
            "description": "A phone",
            "image": null,
            "category_id": category_id,
            "price_per_unit": 300
        })),
    )
    .await;
    let product_id = product["id"].as_str().unwrap().to_string();

    // A version that should die with the product.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/products/{product_id}/versions"),
        Some(&owner),
        Some(json!({ "version_name": "initial", "is_current": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let update = json!({
        "name": "Hijacked",
        "description": "A phone",
        "image": null,
        "category_id": category_id,
        "price_per_unit": 1
    });
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/products/{product_id}"),
        Some(&intruder),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/products/{product_id}"),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, products) = send(&app, "GET", "/products", None, None).await;
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["name"], "Smartphone");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/products/{product_id}"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, products) = send(&app, "GET", "/products", None, None).await;
    assert_eq!(products.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn mutation_requires_authentication() {
    let app = test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/products",
        None,
        Some(json!({
            "name": "Phone",
            "description": "x",
            "image": null,
            "category_id": uuid::Uuid::new_v4(),
            "price_per_unit": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/products/{}", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn active_version_follows_the_current_flag() {
    let app = test_app();
    let token = register_and_login(&app, "owner@example.com").await;
    let category_id = create_category(&app, &token, "Electronics").await;

    let (_, product) = send(
        &app,
        "POST",
        "/products",
        Some(&token),
        Some(json!({
            "name": "Smartphone",
            "description": "A phone",
            "image": null,
            "category_id": category_id,
            "price_per_unit": 300
        })),
    )
    .await;
    let product_id = product["id"].as_str().unwrap().to_string();

    let (_, first) = send(
        &app,
        "POST",
        &format!("/products/{product_id}/versions"),
        Some(&token),
        Some(json!({ "version_name": "initial", "version_number": "1.0.0", "is_current": true })),
    )
    .await;
    let (status, second) = send(
        &app,
        "POST",
        &format!("/products/{product_id}/versions"),
        Some(&token),
        Some(json!({ "version_name": "draft", "version_number": "2.0.0" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/products/{product_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["active_version"]["id"], first["id"]);

    // Flipping the flag to the second version moves it off the first.
    let second_id = second["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/versions/{second_id}"),
        Some(&token),
        Some(json!({ "version_name": "draft", "version_number": "2.0.0", "is_current": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/products/{product_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["active_version"]["id"], second["id"]);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = test_app();
    let token = register_and_login(&app, "owner@example.com").await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/products/{}", uuid::Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    register_and_login(&app, "dup@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "dup@example.com", "password": "Secret$123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_survives_a_failed_verification_mail() {
    let app = test_app();

    // The double @ passes the registration check but the mail transport
    // cannot build a mailbox from it, so the send fails. The account must
    // still be created and usable.
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "odd@@example.com", "password": "Secret$123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "odd@@example.com", "password": "Secret$123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn weak_passwords_are_rejected_at_registration() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "weak@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");
}
