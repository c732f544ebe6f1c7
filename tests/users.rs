#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{TestContext, PASSWORD};

#[actix_web::test]
async fn test_register_login_logout() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/users/")
        .set_json(json!({
            "email": "new@example.com",
            "username": "newcomer",
            "first_name": "New",
            "last_name": "Comer",
            "password": "hunter2-hunter2"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "newcomer");
    assert!(body.get("password").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "new@example.com", "password": "hunter2-hunter2"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["auth_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(("Authorization", format!("Token {}", token)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["email"], "new@example.com");

    let req = test::TestRequest::post()
        .uri("/api/auth/token/logout/")
        .insert_header(("Authorization", format!("Token {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    // Le token révoqué ne passe plus
    let req = test::TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(("Authorization", format!("Token {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_register_rejects_duplicates_and_reserved_username() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    ctx.user("taken").await;

    let req = test::TestRequest::post()
        .uri("/api/users/")
        .set_json(json!({
            "email": "taken@example.com",
            "username": "me",
            "first_name": "A",
            "last_name": "B",
            "password": "whatever-123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("email").is_some());
    assert!(body.get("username").is_some());
}

#[actix_web::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    ctx.user("alice").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "alice@example.com", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("non_field_errors").is_some());
}

#[actix_web::test]
async fn test_set_password() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let user = ctx.user("alice").await;

    let req = test::TestRequest::post()
        .uri("/api/users/set_password/")
        .insert_header(ctx.auth(&user))
        .set_json(json!({"current_password": "nope", "new_password": "brand-new-1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/users/set_password/")
        .insert_header(ctx.auth(&user))
        .set_json(json!({"current_password": PASSWORD, "new_password": "brand-new-1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "alice@example.com", "password": "brand-new-1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_user_list_and_detail() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let alice = ctx.user("alice").await;
    ctx.user("bob").await;

    let req = test::TestRequest::get().uri("/api/users/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["is_subscribed"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/", alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "alice");

    let req = test::TestRequest::get().uri("/api/users/9999/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_subscriptions() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let reader = ctx.user("reader").await;
    let author = ctx.user("author").await;
    let tag = ctx.tag("daily").await;
    let oats = ctx.ingredient("oats", "g").await;
    for name in ["Porridge", "Granola", "Muesli"] {
        ctx.recipe(&author, name, &[tag.id], &[(oats.id, 80)]).await;
    }

    // Pas d'abonnement à soi-même
    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/", reader.id))
        .insert_header(ctx.auth(&reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/?recipes_limit=2", author.id))
        .insert_header(ctx.auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 3);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);

    // Doublon -> 400
    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/", author.id))
        .insert_header(ctx.auth(&reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/users/subscriptions/?recipes_limit=1")
        .insert_header(ctx.auth(&reader))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "author");
    assert_eq!(body["results"][0]["recipes"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/users/subscriptions/?recipes_limit=lots")
        .insert_header(ctx.auth(&reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/", author.id))
        .insert_header(ctx.auth(&reader))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_subscribed"], true);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}/subscribe/", author.id))
        .insert_header(ctx.auth(&reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}/subscribe/", author.id))
        .insert_header(ctx.auth(&reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
