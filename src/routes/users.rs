use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{RegisterRequest, RegisteredUserResponse, SetPasswordRequest};
use crate::services::subscription_service::SubscriptionService;
use crate::services::user_service::UserService;
use crate::utils::pagination::{Page, PageRequest, QueryParams};

/// GET /users/ - Liste paginée (PUBLIC)
#[get("/")]
pub async fn list_users(
    req: HttpRequest,
    auth_user: Option<AuthUser>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let params = QueryParams::from_request(&req);
    let page = PageRequest::from_params(&params, config.page_size)?;

    let (rows, count) = UserService::list(db.get_ref(), page).await?;
    let viewer_id = auth_user.map(|u| u.user_id);
    let results = UserService::to_responses(db.get_ref(), viewer_id, &rows).await?;

    Ok(HttpResponse::Ok().json(Page::new(&req, &params, page, count, results)))
}

/// POST /users/ - Inscription (PUBLIC)
#[post("/")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::register(db.get_ref(), body.into_inner(), config.password_iterations).await?;

    Ok(HttpResponse::Created().json(RegisteredUserResponse {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// GET /users/me/ - Utilisateur courant (PROTÉGÉ)
#[get("/me/")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(UserService::to_response(&auth_user.user, false))
}

/// POST /users/set_password/ (PROTÉGÉ)
#[post("/set_password/")]
pub async fn set_password(
    auth_user: AuthUser,
    body: web::Json<SetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let user_id = auth_user.user_id;
    UserService::set_password(db.get_ref(), auth_user.user, body.into_inner(), config.password_iterations).await?;

    tracing::info!("Password changed for user {}", user_id);
    Ok(HttpResponse::NoContent().finish())
}

/// GET /users/subscriptions/ - Auteurs suivis, paginé (PROTÉGÉ)
#[get("/subscriptions/")]
pub async fn subscriptions(
    req: HttpRequest,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let params = QueryParams::from_request(&req);
    let page = PageRequest::from_params(&params, config.page_size)?;
    let recipes_limit = SubscriptionService::recipes_limit(&params)?;

    let (results, count) = SubscriptionService::list(
        db.get_ref(),
        &config.media_url,
        auth_user.user_id,
        page,
        recipes_limit,
    )
    .await?;

    Ok(HttpResponse::Ok().json(Page::new(&req, &params, page, count, results)))
}

/// GET /users/{id}/ (PUBLIC)
#[get("/{id}/")]
pub async fn get_user(
    path: web::Path<i32>,
    auth_user: Option<AuthUser>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::get(db.get_ref(), path.into_inner()).await?;
    let viewer_id = auth_user.map(|u| u.user_id);

    let mut responses = UserService::to_responses(db.get_ref(), viewer_id, std::slice::from_ref(&user)).await?;
    let response = responses
        .pop()
        .ok_or_else(|| AppError::Internal("User response could not be built".to_string()))?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /users/{id}/subscribe/ (PROTÉGÉ)
#[post("/{id}/subscribe/")]
pub async fn subscribe(
    req: HttpRequest,
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let params = QueryParams::from_request(&req);
    let recipes_limit = SubscriptionService::recipes_limit(&params)?;

    let response = SubscriptionService::subscribe(
        db.get_ref(),
        &config.media_url,
        auth_user.user_id,
        path.into_inner(),
        recipes_limit,
    )
    .await?;

    Ok(HttpResponse::Created().json(response))
}

/// DELETE /users/{id}/subscribe/ (PROTÉGÉ)
#[delete("/{id}/subscribe/")]
pub async fn unsubscribe(
    path: web::Path<i32>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    SubscriptionService::unsubscribe(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn users_routes(cfg: &mut web::ServiceConfig) {
    // Les chemins fixes avant /{id}/
    cfg.service(
        web::scope("/users")
            .service(list_users)
            .service(register)
            .service(me)
            .service(set_password)
            .service(subscriptions)
            .service(get_user)
            .service(subscribe)
            .service(unsubscribe)
    );
}
