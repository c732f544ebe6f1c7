use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{LoginRequest, TokenResponse};
use crate::services::user_service::UserService;
use crate::utils::jwt;

/// POST /auth/token/login/ - Obtenir un token (PUBLIC)
#[post("/login/")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::authenticate(db.get_ref(), &body.email, &body.password).await?;

    let token = jwt::generate_token(&user, &config.jwt_secret, config.jwt_ttl_hours)
        .map_err(AppError::Internal)?;

    tracing::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(TokenResponse { auth_token: token }))
}

/// POST /auth/token/logout/ - Révoque tous les tokens de l'utilisateur (PROTÉGÉ)
#[post("/logout/")]
pub async fn logout(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user_id = auth_user.user_id;
    UserService::revoke_tokens(db.get_ref(), auth_user.user).await?;

    tracing::info!("User {} logged out", user_id);
    Ok(HttpResponse::NoContent().finish())
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth/token")
            .service(login)
            .service(logout)
    );
}
