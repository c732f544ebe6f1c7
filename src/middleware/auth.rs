use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::users::{self, Entity as Users};
use crate::utils::jwt;

/// Structure qui contient l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées.
/// Pour les routes publiques, utiliser `Option<AuthUser>` (None si anonyme).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub user: users::Model,
}

/// Extrait le token du header (format: "Token <jwt>" ou "Bearer <jwt>")
fn extract_token(req: &HttpRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided.".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format (expected: Token <token>)".to_string())
        })
}

/// Implémentation de FromRequest pour AuthUser
/// Vérifie le JWT puis charge l'utilisateur : un token émis avant un logout
/// (token_version différent) est refusé.
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = extract_token(req);
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();
        let config = req.app_data::<web::Data<AppConfig>>().cloned();

        Box::pin(async move {
            let token = token?;
            let (db, config) = match (db, config) {
                (Some(db), Some(config)) => (db, config),
                _ => return Err(AppError::Internal("Application state is not configured".to_string())),
            };

            let claims = jwt::verify_token(&token, &config.jwt_secret)
                .map_err(AppError::Unauthorized)?;

            let user = Users::find_by_id(claims.sub)
                .one(db.get_ref())
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            if user.token_version != claims.ver {
                return Err(AppError::Unauthorized("Token has been revoked".to_string()));
            }

            Ok(AuthUser {
                user_id: user.id,
                user,
            })
        })
    }
}
