use std::collections::HashMap;

use chrono::Utc;
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::{RecipeShortResponse, SubscriptionResponse};
use crate::models::{recipe, subscription, users};
use crate::services::recipe_service::RecipeService;
use crate::services::user_service::UserService;
use crate::utils::pagination::{PageRequest, QueryParams};

pub struct SubscriptionService;

impl SubscriptionService {
    /// recipes_limit : entier >= 0, absent = toutes les recettes
    pub fn recipes_limit(params: &QueryParams) -> Result<Option<usize>, AppError> {
        match params.get("recipes_limit") {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<usize>()
                .map(Some)
                .map_err(|_| AppError::field("recipes_limit", "A valid integer is required.")),
        }
    }

    /// POST /users/{id}/subscribe/
    pub async fn subscribe(
        db: &DatabaseConnection,
        media_url: &str,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> Result<SubscriptionResponse, AppError> {
        let author = UserService::get(db, author_id).await?;

        if author.id == user_id {
            return Err(AppError::BadRequest("You cannot subscribe to yourself.".to_string()));
        }
        if Self::find(db, user_id, author.id).await?.is_some() {
            return Err(AppError::BadRequest("You are already subscribed to this user.".to_string()));
        }

        subscription::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author.id),
            subscribed_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!("User {} subscribed to {}", user_id, author.id);

        Self::to_responses(db, media_url, vec![author], recipes_limit)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Subscription response could not be built".to_string()))
    }

    /// DELETE /users/{id}/subscribe/
    pub async fn unsubscribe(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<(), AppError> {
        let author = UserService::get(db, author_id).await?;

        if author.id == user_id {
            return Err(AppError::BadRequest("You cannot unsubscribe from yourself.".to_string()));
        }

        let existing = Self::find(db, user_id, author.id)
            .await?
            .ok_or_else(|| AppError::BadRequest("You are not subscribed to this user.".to_string()))?;

        subscription::Entity::delete_by_id(existing.id).exec(db).await?;
        tracing::info!("User {} unsubscribed from {}", user_id, author.id);
        Ok(())
    }

    /// GET /users/subscriptions/ : abonnements les plus récents d'abord
    pub async fn list(
        db: &DatabaseConnection,
        media_url: &str,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<usize>,
    ) -> Result<(Vec<SubscriptionResponse>, u64), AppError> {
        let paginator = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .order_by_desc(subscription::Column::Id)
            .paginate(db, page.limit);

        let count = paginator.num_items().await?;
        page.check_in_range(count)?;
        let rows = paginator.fetch_page(page.page_index()).await?;

        let author_ids: Vec<i32> = rows.iter().map(|s| s.author_id).collect();
        let mut authors: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        // Conserve l'ordre des abonnements
        let ordered: Vec<users::Model> = author_ids
            .iter()
            .filter_map(|id| authors.remove(id))
            .collect();

        let responses = Self::to_responses(db, media_url, ordered, recipes_limit).await?;
        Ok((responses, count))
    }

    async fn find(
        db: &DatabaseConnection,
        user_id: i32,
        author_id: i32,
    ) -> Result<Option<subscription::Model>, DbErr> {
        subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .one(db)
            .await
    }

    /// Vue "auteur suivi" : recettes chargées en UNE requête pour tous les auteurs
    async fn to_responses(
        db: &DatabaseConnection,
        media_url: &str,
        authors: Vec<users::Model>,
        recipes_limit: Option<usize>,
    ) -> Result<Vec<SubscriptionResponse>, AppError> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        let recipes = recipe::Entity::find()
            .filter(recipe::Column::AuthorId.is_in(author_ids))
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .all(db)
            .await?;

        let mut by_author: HashMap<i32, Vec<RecipeShortResponse>> = HashMap::new();
        for recipe in &recipes {
            by_author
                .entry(recipe.author_id)
                .or_default()
                .push(RecipeService::to_short_response(recipe, media_url));
        }

        Ok(authors
            .into_iter()
            .map(|author| {
                let mut recipes = by_author.remove(&author.id).unwrap_or_default();
                let recipes_count = recipes.len() as u64;
                if let Some(limit) = recipes_limit {
                    recipes.truncate(limit);
                }

                // Le lecteur suit forcément ces auteurs
                SubscriptionResponse {
                    email: author.email,
                    id: author.id,
                    username: author.username,
                    first_name: author.first_name,
                    last_name: author.last_name,
                    is_subscribed: true,
                    recipes,
                    recipes_count,
                }
            })
            .collect())
    }
}
