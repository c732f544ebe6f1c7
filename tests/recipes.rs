#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

use foodgram::models::{favorite, recipe_ingredient, recipe_tag, shopping_cart};

use common::{TestContext, PIXEL};

#[actix_web::test]
async fn test_create_recipe_returns_full_view() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let breakfast = ctx.tag("breakfast").await;
    let eggs = ctx.ingredient("eggs", "pcs").await;
    let flour = ctx.ingredient("flour", "g").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(ctx.auth(&author))
        .set_json(json!({
            "ingredients": [{"id": eggs.id, "amount": 3}, {"id": flour.id, "amount": 200}],
            "tags": [breakfast.id],
            "image": PIXEL,
            "name": "Pancakes",
            "text": "Whisk and fry.",
            "cooking_time": 15
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Pancakes");
    assert_eq!(body["author"]["username"], "chef");
    assert_eq!(body["tags"][0]["slug"], "breakfast");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["is_favorited"], false);

    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("/media/recipes/"));
    let stored = ctx.media.path().join(image.trim_start_matches("/media/"));
    assert!(stored.exists());
}

#[actix_web::test]
async fn test_create_recipe_requires_tags_and_ingredients() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(ctx.auth(&author))
        .set_json(json!({
            "ingredients": [],
            "image": PIXEL,
            "name": "Air",
            "text": "Nothing.",
            "cooking_time": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("tags").is_some());
    assert!(body.get("ingredients").is_some());
}

#[actix_web::test]
async fn test_create_recipe_rejects_duplicate_tags() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let tag = ctx.tag("lunch").await;
    let salt = ctx.ingredient("salt", "g").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(ctx.auth(&author))
        .set_json(json!({
            "ingredients": [{"id": salt.id, "amount": 1}],
            "tags": [tag.id, tag.id],
            "image": PIXEL,
            "name": "Salt",
            "text": "Salty.",
            "cooking_time": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("tags").is_some());
    assert!(body.get("ingredients").is_none());
}

#[actix_web::test]
async fn test_create_recipe_rejects_duplicate_ingredients() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let tag = ctx.tag("lunch").await;
    let salt = ctx.ingredient("salt", "g").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(ctx.auth(&author))
        .set_json(json!({
            "ingredients": [{"id": salt.id, "amount": 1}, {"id": salt.id, "amount": 2}],
            "tags": [tag.id],
            "image": PIXEL,
            "name": "Salt",
            "text": "Salty.",
            "cooking_time": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("ingredients").is_some());
    assert!(body.get("tags").is_none());
}

#[actix_web::test]
async fn test_create_recipe_rejects_unknown_ingredient() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let tag = ctx.tag("lunch").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(ctx.auth(&author))
        .set_json(json!({
            "ingredients": [{"id": 9999, "amount": 1}],
            "tags": [tag.id],
            "image": PIXEL,
            "name": "Ghost",
            "text": "Unknown ingredient.",
            "cooking_time": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("ingredients").is_some());
}

#[actix_web::test]
async fn test_create_recipe_rejects_zero_amount_and_cooking_time() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let tag = ctx.tag("dinner").await;
    let rice = ctx.ingredient("rice", "g").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(ctx.auth(&author))
        .set_json(json!({
            "ingredients": [{"id": rice.id, "amount": 0}],
            "tags": [tag.id],
            "image": PIXEL,
            "name": "Rice",
            "text": "Boil.",
            "cooking_time": 0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("ingredients").is_some());
    assert!(body.get("cooking_time").is_some());
}

#[actix_web::test]
async fn test_create_recipe_requires_authentication() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .set_json(json!({"name": "Anonymous"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_patch_replaces_tags_and_only_author_may_edit() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let other = ctx.user("critic").await;
    let old_tag = ctx.tag("old").await;
    let new_tag = ctx.tag("new").await;
    let milk = ctx.ingredient("milk", "ml").await;
    let recipe = ctx.recipe(&author, "Latte", &[old_tag.id], &[(milk.id, 200)]).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(ctx.auth(&other))
        .set_json(json!({"name": "Stolen"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(ctx.auth(&author))
        .set_json(json!({"name": "Flat white", "tags": [new_tag.id]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Flat white");
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["tags"][0]["slug"], "new");
    // Ingrédients non fournis : conservés
    assert_eq!(body["ingredients"][0]["amount"], 200);
}

#[actix_web::test]
async fn test_patch_with_empty_ingredients_is_rejected() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let tag = ctx.tag("soup").await;
    let water = ctx.ingredient("water", "ml").await;
    let recipe = ctx.recipe(&author, "Broth", &[tag.id], &[(water.id, 500)]).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(ctx.auth(&author))
        .set_json(json!({"ingredients": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_recipe() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let other = ctx.user("critic").await;
    let tag = ctx.tag("cake").await;
    let sugar = ctx.ingredient("sugar", "g").await;
    let recipe = ctx.recipe(&author, "Cake", &[tag.id], &[(sugar.id, 100)]).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(ctx.auth(&other))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    // Favori et panier existants ne bloquent pas la suppression
    let req = test::TestRequest::post()
        .uri(&format!("/api/recipes/{}/favorite/", recipe.id))
        .insert_header(ctx.auth(&other))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/recipes/{}/shopping_cart/", recipe.id))
        .insert_header(ctx.auth(&other))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(ctx.auth(&author))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // Aucune ligne liée ne survit
    let tags = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
        .count(&ctx.db)
        .await
        .unwrap();
    let ingredients = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
        .count(&ctx.db)
        .await
        .unwrap();
    let favorites = favorite::Entity::find()
        .filter(favorite::Column::RecipeId.eq(recipe.id))
        .count(&ctx.db)
        .await
        .unwrap();
    let carts = shopping_cart::Entity::find()
        .filter(shopping_cart::Column::RecipeId.eq(recipe.id))
        .count(&ctx.db)
        .await
        .unwrap();
    assert_eq!((tags, ingredients, favorites, carts), (0, 0, 0, 0));
}

#[actix_web::test]
async fn test_list_filters_and_pagination() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let vegan = ctx.tag("vegan").await;
    let meat = ctx.tag("meat").await;
    let tofu = ctx.ingredient("tofu", "g").await;

    ctx.recipe(&alice, "Tofu bowl", &[vegan.id], &[(tofu.id, 100)]).await;
    ctx.recipe(&alice, "Steak", &[meat.id], &[(tofu.id, 1)]).await;
    ctx.recipe(&bob, "Salad", &[vegan.id], &[(tofu.id, 50)]).await;

    let req = test::TestRequest::get().uri("/api/recipes/?limit=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["next"].as_str().unwrap().contains("page=2"));
    assert!(body["previous"].is_null());
    // Plus récente d'abord
    assert_eq!(body["results"][0]["name"], "Salad");

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/?tags=vegan&author={}", alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Tofu bowl");

    let req = test::TestRequest::get().uri("/api/recipes/?tags=vegan&tags=meat").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 3);

    let req = test::TestRequest::get().uri("/api/recipes/?page=5").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_huge_page_and_limit_do_not_crash() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);
    let author = ctx.user("chef").await;
    let tag = ctx.tag("any").await;
    let rice = ctx.ingredient("rice", "g").await;
    ctx.recipe(&author, "Rice", &[tag.id], &[(rice.id, 100)]).await;

    let req = test::TestRequest::get()
        .uri("/api/recipes/?page=99999999999&limit=99999999999")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Invalid page.");

    let req = test::TestRequest::get()
        .uri("/api/recipes/?limit=18446744073709551615")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert!(body["next"].is_null());
}
