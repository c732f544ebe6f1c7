use actix_web::http::header;
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::RecipeWriteRequest;
use crate::services::collection_service::{CollectionService, Favorites, RecipeCollection, ShoppingCart};
use crate::services::recipe_service::{RecipeFilter, RecipeService};
use crate::services::shopping_list_service::ShoppingListService;
use crate::utils::pagination::{Page, PageRequest, QueryParams};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// GET /recipes/ - Liste paginée et filtrée (PUBLIC)
#[get("/")]
pub async fn list_recipes(
    req: HttpRequest,
    auth_user: Option<AuthUser>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let params = QueryParams::from_request(&req);
    let page = PageRequest::from_params(&params, config.page_size)?;
    let filter = RecipeFilter::from_params(&params)?;
    let viewer_id = auth_user.map(|u| u.user_id);

    let (results, count) =
        RecipeService::list(db.get_ref(), &config.media_url, viewer_id, &filter, page).await?;

    Ok(HttpResponse::Ok().json(Page::new(&req, &params, page, count, results)))
}

/// POST /recipes/ (PROTÉGÉ)
#[post("/")]
pub async fn create_recipe(
    auth_user: AuthUser,
    body: web::Json<RecipeWriteRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let recipe = RecipeService::create(db.get_ref(), config.get_ref(), &auth_user.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(recipe))
}

/// GET /recipes/download_shopping_cart/ - Liste de courses .xlsx (PROTÉGÉ)
#[get("/download_shopping_cart/")]
pub async fn download_shopping_cart(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (file_name, bytes) = ShoppingListService::download(db.get_ref(), auth_user.user_id).await?;

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", file_name),
        ))
        .body(bytes))
}

/// GET /recipes/{id}/ (PUBLIC)
#[get("/{id}/")]
pub async fn get_recipe(
    path: web::Path<i32>,
    auth_user: Option<AuthUser>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let viewer_id = auth_user.map(|u| u.user_id);
    let recipe = RecipeService::get(db.get_ref(), &config.media_url, viewer_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(recipe))
}

/// PATCH /recipes/{id}/ - Auteur uniquement (PROTÉGÉ)
#[patch("/{id}/")]
pub async fn update_recipe(
    path: web::Path<i32>,
    auth_user: AuthUser,
    body: web::Json<RecipeWriteRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let recipe = RecipeService::update(
        db.get_ref(),
        config.get_ref(),
        &auth_user.user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

/// DELETE /recipes/{id}/ - Auteur uniquement (PROTÉGÉ)
#[delete("/{id}/")]
pub async fn delete_recipe(
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    RecipeService::delete(db.get_ref(), config.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_to_collection(
    collection: &dyn RecipeCollection,
    recipe_id: i32,
    auth_user: AuthUser,
    db: &DatabaseConnection,
    config: &AppConfig,
) -> Result<HttpResponse, AppError> {
    let recipe = CollectionService::add(db, collection, &config.media_url, auth_user.user_id, recipe_id).await?;
    Ok(HttpResponse::Created().json(recipe))
}

async fn remove_from_collection(
    collection: &dyn RecipeCollection,
    recipe_id: i32,
    auth_user: AuthUser,
    db: &DatabaseConnection,
) -> Result<HttpResponse, AppError> {
    CollectionService::remove(db, collection, auth_user.user_id, recipe_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /recipes/{id}/favorite/ (PROTÉGÉ)
#[post("/{id}/favorite/")]
pub async fn add_favorite(
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    add_to_collection(&Favorites, path.into_inner(), auth_user, db.get_ref(), config.get_ref()).await
}

/// DELETE /recipes/{id}/favorite/ (PROTÉGÉ)
#[delete("/{id}/favorite/")]
pub async fn remove_favorite(
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    remove_from_collection(&Favorites, path.into_inner(), auth_user, db.get_ref()).await
}

/// POST /recipes/{id}/shopping_cart/ (PROTÉGÉ)
#[post("/{id}/shopping_cart/")]
pub async fn add_to_shopping_cart(
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    add_to_collection(&ShoppingCart, path.into_inner(), auth_user, db.get_ref(), config.get_ref()).await
}

/// DELETE /recipes/{id}/shopping_cart/ (PROTÉGÉ)
#[delete("/{id}/shopping_cart/")]
pub async fn remove_from_shopping_cart(
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    remove_from_collection(&ShoppingCart, path.into_inner(), auth_user, db.get_ref()).await
}

pub fn recipes_routes(cfg: &mut web::ServiceConfig) {
    // download_shopping_cart avant /{id}/
    cfg.service(
        web::scope("/recipes")
            .service(list_recipes)
            .service(create_recipe)
            .service(download_shopping_cart)
            .service(get_recipe)
            .service(update_recipe)
            .service(delete_recipe)
            .service(add_favorite)
            .service(remove_favorite)
            .service(add_to_shopping_cart)
            .service(remove_from_shopping_cart)
    );
}
