// ============================================================================
// COLLECTIONS DE RECETTES : favoris et panier
// ============================================================================
//
// Les deux collections ont exactement le même cycle de vie (ajout unique,
// retrait, vue courte) : une seule implémentation derrière le trait
// RecipeCollection.
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::RecipeShortResponse;
use crate::models::{favorite, recipe, shopping_cart};
use crate::services::recipe_service::RecipeService;

#[async_trait]
pub trait RecipeCollection: Send + Sync {
    /// Message quand la recette est déjà présente
    fn already_present(&self) -> &'static str;

    /// Message quand la recette est absente
    fn not_present(&self) -> &'static str;

    async fn contains(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<bool, DbErr>;

    async fn insert(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<(), DbErr>;

    /// Retourne le nombre de lignes supprimées
    async fn remove(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<u64, DbErr>;
}

pub struct Favorites;

#[async_trait]
impl RecipeCollection for Favorites {
    fn already_present(&self) -> &'static str {
        "The recipe is already in favorites!"
    }

    fn not_present(&self) -> &'static str {
        "The recipe is not found in favorites."
    }

    async fn contains(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<bool, DbErr> {
        let count = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::RecipeId.eq(recipe_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<(), DbErr> {
        favorite::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(())
    }

    async fn remove(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<u64, DbErr> {
        let result = favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

pub struct ShoppingCart;

#[async_trait]
impl RecipeCollection for ShoppingCart {
    fn already_present(&self) -> &'static str {
        "The recipe is already in the shopping cart!"
    }

    fn not_present(&self) -> &'static str {
        "The recipe is not found in the shopping cart."
    }

    async fn contains(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<bool, DbErr> {
        let count = shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<(), DbErr> {
        shopping_cart::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            added_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(())
    }

    async fn remove(&self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> Result<u64, DbErr> {
        let result = shopping_cart::Entity::delete_many()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

pub struct CollectionService;

impl CollectionService {
    /// POST : recette inconnue -> 400, déjà présente -> 400
    pub async fn add(
        db: &DatabaseConnection,
        collection: &dyn RecipeCollection,
        media_url: &str,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<RecipeShortResponse, AppError> {
        let recipe = recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::BadRequest("The recipe does not exist.".to_string()))?;

        if collection.contains(db, user_id, recipe.id).await? {
            return Err(AppError::BadRequest(collection.already_present().to_string()));
        }

        // Course possible entre contains et insert : l'index unique tranche (-> 400)
        collection.insert(db, user_id, recipe.id).await?;

        Ok(RecipeService::to_short_response(&recipe, media_url))
    }

    /// DELETE : recette inconnue -> 404, absente de la collection -> 400
    pub async fn remove(
        db: &DatabaseConnection,
        collection: &dyn RecipeCollection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), AppError> {
        let recipe = RecipeService::find(db, recipe_id).await?;

        let removed = collection.remove(db, user_id, recipe.id).await?;
        if removed == 0 {
            return Err(AppError::BadRequest(collection.not_present().to_string()));
        }
        Ok(())
    }
}
