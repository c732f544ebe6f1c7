// Tags et ingrédients : référentiels en lecture seule, non paginés

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::{IngredientResponse, TagResponse};
use crate::models::{ingredient, tag};

pub struct CatalogService;

impl CatalogService {
    pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<TagResponse>, AppError> {
        let tags = tag::Entity::find()
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await?;
        Ok(tags.into_iter().map(tag_response).collect())
    }

    pub async fn get_tag(db: &DatabaseConnection, tag_id: i32) -> Result<TagResponse, AppError> {
        tag::Entity::find_by_id(tag_id)
            .one(db)
            .await?
            .map(tag_response)
            .ok_or_else(AppError::not_found)
    }

    /// ?name=<préfixe> : recherche insensible à la casse, triée par nom.
    /// LOWER() de SQLite ne replie que l'ASCII : sur ce backend le préfixe
    /// est comparé en Rust (casse Unicode), ailleurs en SQL.
    pub async fn list_ingredients(
        db: &DatabaseConnection,
        name_prefix: Option<&str>,
    ) -> Result<Vec<IngredientResponse>, AppError> {
        let prefix = name_prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase);

        let query = ingredient::Entity::find().order_by_asc(ingredient::Column::Name);

        let ingredients = match (&prefix, db.get_database_backend()) {
            (Some(prefix), DbBackend::Sqlite) => query
                .all(db)
                .await?
                .into_iter()
                .filter(|i| i.name.to_lowercase().starts_with(prefix.as_str()))
                .collect(),
            (Some(prefix), _) => {
                let pattern = format!("{}%", escape_like(prefix));
                query
                    .filter(
                        Expr::expr(Func::lower(Expr::col((ingredient::Entity, ingredient::Column::Name))))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    )
                    .all(db)
                    .await?
            }
            (None, _) => query.all(db).await?,
        };

        Ok(ingredients.into_iter().map(ingredient_response).collect())
    }

    pub async fn get_ingredient(db: &DatabaseConnection, ingredient_id: i32) -> Result<IngredientResponse, AppError> {
        ingredient::Entity::find_by_id(ingredient_id)
            .one(db)
            .await?
            .map(ingredient_response)
            .ok_or_else(AppError::not_found)
    }
}

pub fn tag_response(tag: tag::Model) -> TagResponse {
    TagResponse {
        id: tag.id,
        name: tag.name,
        color: tag.color,
        slug: tag.slug,
    }
}

fn ingredient_response(ingredient: ingredient::Model) -> IngredientResponse {
    IngredientResponse {
        id: ingredient.id,
        name: ingredient.name,
        measurement_unit: ingredient.measurement_unit,
    }
}

/// Les jokers LIKE saisis par l'utilisateur sont pris littéralement
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
