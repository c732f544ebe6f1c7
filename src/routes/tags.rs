use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::services::catalog_service::CatalogService;

/// GET /tags/ - Tous les tags, non paginé (PUBLIC)
#[get("/")]
pub async fn list_tags(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let tags = CatalogService::list_tags(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

#[get("/{id}/")]
pub async fn get_tag(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let tag = CatalogService::get_tag(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tag))
}

pub fn tags_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tags")
            .service(list_tags)
            .service(get_tag)
    );
}
