pub mod auth;
pub mod health;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use actix_web::web;

use crate::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Corps JSON / chemins / query invalides -> même format d'erreur que le reste de l'API
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|_err, _req| AppError::not_found().into()))
    .service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(users::users_routes)
            .configure(tags::tags_routes)
            .configure(ingredients::ingredients_routes)
            .configure(recipes::recipes_routes),
    );
}
