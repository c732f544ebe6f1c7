use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::*;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::{field_errors_from, push_error, AppError, FieldErrors, REQUIRED_FIELD};
use crate::models::dto::{
    IngredientAmountRequest, RecipeIngredientResponse, RecipeResponse, RecipeShortResponse,
    RecipeWriteRequest, TagResponse,
};
use crate::models::{favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, users};
use crate::services::catalog_service;
use crate::services::user_service::UserService;
use crate::utils::media::{self, DecodedImage};
use crate::utils::pagination::{PageRequest, QueryParams};
use crate::utils::validators::{check_ingredient_amounts, check_tag_ids};

/// Filtres de GET /recipes/
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeFilter {
    pub tags: Vec<String>, // slugs, un seul suffit (OR)
    pub author: Option<i32>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_params(params: &QueryParams) -> Result<Self, AppError> {
        let author = match params.get("author") {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| AppError::field("author", "Enter a number."))?,
            ),
        };

        Ok(Self {
            tags: params.get_all("tags"),
            author,
            is_favorited: params.flag("is_favorited"),
            is_in_shopping_cart: params.flag("is_in_shopping_cart"),
        })
    }
}

/// Payload validé, prêt à être écrit
struct ValidatedRecipe {
    tags: Option<Vec<i32>>,
    ingredients: Option<Vec<(i32, i32)>>, // (ingredient_id, amount)
    image: Option<DecodedImage>,
}

pub struct RecipeService;

impl RecipeService {
    pub async fn find(db: &DatabaseConnection, recipe_id: i32) -> Result<recipe::Model, AppError> {
        recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(AppError::not_found)
    }

    pub async fn get(
        db: &DatabaseConnection,
        media_url: &str,
        viewer_id: Option<i32>,
        recipe_id: i32,
    ) -> Result<RecipeResponse, AppError> {
        let recipe = Self::find(db, recipe_id).await?;
        Self::to_response(db, media_url, viewer_id, recipe).await
    }

    /// Liste paginée, plus récentes d'abord
    pub async fn list(
        db: &DatabaseConnection,
        media_url: &str,
        viewer_id: Option<i32>,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<RecipeResponse>, u64), AppError> {
        let mut query = recipe::Entity::find();

        if let Some(author_id) = filter.author {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }

        if !filter.tags.is_empty() {
            let tagged: Vec<i32> = recipe_tag::Entity::find()
                .select_only()
                .column(recipe_tag::Column::RecipeId)
                .inner_join(tag::Entity)
                .filter(tag::Column::Slug.is_in(filter.tags.clone()))
                .distinct()
                .into_tuple()
                .all(db)
                .await?;
            query = query.filter(recipe::Column::Id.is_in(tagged));
        }

        // Filtres personnels ignorés pour un anonyme
        if let Some(viewer_id) = viewer_id {
            if filter.is_favorited {
                let favorited: Vec<i32> = favorite::Entity::find()
                    .select_only()
                    .column(favorite::Column::RecipeId)
                    .filter(favorite::Column::UserId.eq(viewer_id))
                    .into_tuple()
                    .all(db)
                    .await?;
                query = query.filter(recipe::Column::Id.is_in(favorited));
            }
            if filter.is_in_shopping_cart {
                let in_cart: Vec<i32> = shopping_cart::Entity::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(viewer_id))
                    .into_tuple()
                    .all(db)
                    .await?;
                query = query.filter(recipe::Column::Id.is_in(in_cart));
            }
        }

        let paginator = query
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .paginate(db, page.limit);

        let count = paginator.num_items().await?;
        page.check_in_range(count)?;
        let recipes = paginator.fetch_page(page.page_index()).await?;

        let responses = Self::to_responses(db, media_url, viewer_id, recipes).await?;
        Ok((responses, count))
    }

    /// POST /recipes/ : recette + tags + ingrédients dans UNE transaction
    pub async fn create(
        db: &DatabaseConnection,
        config: &AppConfig,
        author: &users::Model,
        request: RecipeWriteRequest,
    ) -> Result<RecipeResponse, AppError> {
        let validated = Self::validate_write(db, &request, false).await?;

        let (Some(name), Some(text), Some(cooking_time), Some(image), Some(tags), Some(ingredients)) = (
            request.name,
            request.text,
            request.cooking_time,
            validated.image,
            validated.tags,
            validated.ingredients,
        ) else {
            return Err(AppError::Internal("Validated recipe is missing a required field".to_string()));
        };

        let image_path = media::save_image(&config.media_root, &image).await?;

        let txn = db.begin().await?;
        let inserted = async {
            let recipe = recipe::ActiveModel {
                author_id: Set(author.id),
                name: Set(name),
                image: Set(image_path.clone()),
                text: Set(text),
                cooking_time: Set(cooking_time),
                pub_date: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            Self::replace_tags(&txn, recipe.id, &tags).await?;
            Self::replace_ingredients(&txn, recipe.id, &ingredients).await?;
            Ok::<_, DbErr>(recipe)
        }
        .await;

        let recipe = match inserted {
            Ok(recipe) => {
                txn.commit().await?;
                recipe
            }
            Err(e) => {
                txn.rollback().await?;
                media::remove_image(&config.media_root, &image_path).await;
                return Err(e.into());
            }
        };

        tracing::info!("Recipe {} created by user {}", recipe.id, author.id);
        Self::to_response(db, &config.media_url, Some(author.id), recipe).await
    }

    /// PATCH /recipes/{id}/ : seul l'auteur peut modifier.
    /// Les tags/ingrédients fournis remplacent entièrement les anciens.
    pub async fn update(
        db: &DatabaseConnection,
        config: &AppConfig,
        user: &users::Model,
        recipe_id: i32,
        request: RecipeWriteRequest,
    ) -> Result<RecipeResponse, AppError> {
        let recipe = Self::find(db, recipe_id).await?;
        if recipe.author_id != user.id {
            return Err(AppError::permission_denied());
        }

        let validated = Self::validate_write(db, &request, true).await?;

        let new_image_path = match &validated.image {
            Some(image) => Some(media::save_image(&config.media_root, image).await?),
            None => None,
        };
        let old_image_path = recipe.image.clone();

        let txn = db.begin().await?;
        let updated = async {
            let mut active_model: recipe::ActiveModel = recipe.clone().into();
            if let Some(name) = request.name {
                active_model.name = Set(name);
            }
            if let Some(text) = request.text {
                active_model.text = Set(text);
            }
            if let Some(cooking_time) = request.cooking_time {
                active_model.cooking_time = Set(cooking_time);
            }
            if let Some(path) = &new_image_path {
                active_model.image = Set(path.clone());
            }

            let updated = if active_model.is_changed() {
                active_model.update(&txn).await?
            } else {
                recipe
            };

            if let Some(tags) = &validated.tags {
                Self::replace_tags(&txn, updated.id, tags).await?;
            }
            if let Some(ingredients) = &validated.ingredients {
                Self::replace_ingredients(&txn, updated.id, ingredients).await?;
            }
            Ok::<_, DbErr>(updated)
        }
        .await;

        let updated = match updated {
            Ok(updated) => {
                txn.commit().await?;
                updated
            }
            Err(e) => {
                txn.rollback().await?;
                if let Some(path) = &new_image_path {
                    media::remove_image(&config.media_root, path).await;
                }
                return Err(e.into());
            }
        };

        if new_image_path.is_some() {
            media::remove_image(&config.media_root, &old_image_path).await;
        }

        tracing::info!("Recipe {} updated by user {}", updated.id, user.id);
        Self::to_response(db, &config.media_url, Some(user.id), updated).await
    }

    /// DELETE /recipes/{id}/ : cascade sur tags, ingrédients, favoris, paniers
    pub async fn delete(
        db: &DatabaseConnection,
        config: &AppConfig,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), AppError> {
        let recipe = Self::find(db, recipe_id).await?;
        if recipe.author_id != user_id {
            return Err(AppError::permission_denied());
        }

        let txn = db.begin().await?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        favorite::Entity::delete_many()
            .filter(favorite::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        shopping_cart::Entity::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        recipe::Entity::delete_by_id(recipe.id).exec(&txn).await?;
        txn.commit().await?;

        media::remove_image(&config.media_root, &recipe.image).await;
        tracing::info!("Recipe {} deleted by user {}", recipe.id, user_id);
        Ok(())
    }

    /// Valide le payload d'écriture. `partial` = PATCH (champs absents conservés).
    /// Toutes les erreurs sont accumulées avant de répondre 400.
    async fn validate_write(
        db: &DatabaseConnection,
        request: &RecipeWriteRequest,
        partial: bool,
    ) -> Result<ValidatedRecipe, AppError> {
        let mut errors: FieldErrors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors_from(&e),
        };

        if !partial {
            if request.name.is_none() {
                push_error(&mut errors, "name", REQUIRED_FIELD);
            }
            if request.text.is_none() {
                push_error(&mut errors, "text", REQUIRED_FIELD);
            }
            if request.cooking_time.is_none() {
                push_error(&mut errors, "cooking_time", REQUIRED_FIELD);
            }
        }

        let tags = if !partial || request.tags.is_some() {
            Self::validate_tags(db, request.tags.as_deref(), &mut errors).await?
        } else {
            None
        };

        let ingredients = if !partial || request.ingredients.is_some() {
            Self::validate_ingredients(db, request.ingredients.as_deref(), &mut errors).await?
        } else {
            None
        };

        let image = match request.image.as_deref() {
            None | Some("") if !partial => {
                push_error(&mut errors, "image", REQUIRED_FIELD);
                None
            }
            // En PATCH, le client peut renvoyer l'URL actuelle : image inchangée
            Some(data) if partial && !data.starts_with("data:") => None,
            None | Some("") => None,
            Some(data) => match media::decode_data_uri(data) {
                Ok(image) => Some(image),
                Err(AppError::Validation(image_errors)) => {
                    for (field, messages) in image_errors {
                        for message in messages {
                            push_error(&mut errors, &field, message);
                        }
                    }
                    None
                }
                Err(other) => return Err(other),
            },
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(ValidatedRecipe {
            tags,
            ingredients,
            image,
        })
    }

    async fn validate_tags(
        db: &DatabaseConnection,
        tags: Option<&[i32]>,
        errors: &mut FieldErrors,
    ) -> Result<Option<Vec<i32>>, AppError> {
        let before = errors.get("tags").map_or(0, Vec::len);
        check_tag_ids(tags, errors);
        let Some(tags) = tags else { return Ok(None) };
        if errors.get("tags").map_or(0, Vec::len) > before {
            return Ok(None);
        }

        let existing: HashSet<i32> = tag::Entity::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(tags.to_vec()))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let mut valid = true;
        for id in tags {
            if !existing.contains(id) {
                push_error(errors, "tags", format!("Invalid pk \"{}\" - object does not exist.", id));
                valid = false;
            }
        }

        Ok(valid.then(|| tags.to_vec()))
    }

    async fn validate_ingredients(
        db: &DatabaseConnection,
        ingredients: Option<&[IngredientAmountRequest]>,
        errors: &mut FieldErrors,
    ) -> Result<Option<Vec<(i32, i32)>>, AppError> {
        let before = errors.get("ingredients").map_or(0, Vec::len);
        check_ingredient_amounts(ingredients, errors);
        let Some(ingredients) = ingredients else { return Ok(None) };
        if errors.get("ingredients").map_or(0, Vec::len) > before {
            return Ok(None);
        }

        let ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
        let existing: HashSet<i32> = ingredient::Entity::find()
            .select_only()
            .column(ingredient::Column::Id)
            .filter(ingredient::Column::Id.is_in(ids))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let mut valid = true;
        for item in ingredients {
            if !existing.contains(&item.id) {
                push_error(
                    errors,
                    "ingredients",
                    format!("Ingredient \"{}\" does not exist.", item.id),
                );
                valid = false;
            }
        }

        // amount déjà borné à [1, 32767] par check_ingredient_amounts
        Ok(valid.then(|| {
            ingredients
                .iter()
                .map(|i| (i.id, i.amount as i32))
                .collect()
        }))
    }

    async fn replace_tags(txn: &DatabaseTransaction, recipe_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(txn)
            .await?;

        let rows: Vec<recipe_tag::ActiveModel> = tag_ids
            .iter()
            .map(|tag_id| recipe_tag::ActiveModel {
                recipe_id: Set(recipe_id),
                tag_id: Set(*tag_id),
                ..Default::default()
            })
            .collect();
        if !rows.is_empty() {
            recipe_tag::Entity::insert_many(rows).exec(txn).await?;
        }
        Ok(())
    }

    async fn replace_ingredients(
        txn: &DatabaseTransaction,
        recipe_id: i32,
        ingredients: &[(i32, i32)],
    ) -> Result<(), DbErr> {
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(txn)
            .await?;

        let rows: Vec<recipe_ingredient::ActiveModel> = ingredients
            .iter()
            .map(|(ingredient_id, amount)| recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(*ingredient_id),
                amount: Set(*amount),
                ..Default::default()
            })
            .collect();
        if !rows.is_empty() {
            recipe_ingredient::Entity::insert_many(rows).exec(txn).await?;
        }
        Ok(())
    }

    pub fn to_short_response(recipe: &recipe::Model, media_url: &str) -> RecipeShortResponse {
        RecipeShortResponse {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media::image_url(media_url, &recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }

    pub async fn to_response(
        db: &DatabaseConnection,
        media_url: &str,
        viewer_id: Option<i32>,
        recipe: recipe::Model,
    ) -> Result<RecipeResponse, AppError> {
        Self::to_responses(db, media_url, viewer_id, vec![recipe])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Recipe response could not be built".to_string()))
    }

    /// Construit les réponses complètes en un nombre FIXE de requêtes
    /// (tags, ingrédients, auteurs, favoris, panier, abonnements) puis lookup HashMap
    pub async fn to_responses(
        db: &DatabaseConnection,
        media_url: &str,
        viewer_id: Option<i32>,
        recipes: Vec<recipe::Model>,
    ) -> Result<Vec<RecipeResponse>, AppError> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let author_ids: Vec<i32> = recipes
            .iter()
            .map(|r| r.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // 1. Tags
        let tag_rows = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .find_also_related(tag::Entity)
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await?;
        let mut tags_by_recipe: HashMap<i32, Vec<TagResponse>> = HashMap::new();
        for (link, tag) in tag_rows {
            if let Some(tag) = tag {
                tags_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(catalog_service::tag_response(tag));
            }
        }

        // 2. Ingrédients
        let ingredient_rows = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.clone()))
            .find_also_related(ingredient::Entity)
            .order_by_asc(recipe_ingredient::Column::Id)
            .all(db)
            .await?;
        let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
        for (line, ingredient) in ingredient_rows {
            if let Some(ingredient) = ingredient {
                ingredients_by_recipe
                    .entry(line.recipe_id)
                    .or_default()
                    .push(RecipeIngredientResponse {
                        id: ingredient.id,
                        name: ingredient.name,
                        measurement_unit: ingredient.measurement_unit,
                        amount: line.amount,
                    });
            }
        }

        // 3. Auteurs + abonnements du lecteur
        let authors: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let subscribed = UserService::subscribed_author_ids(db, viewer_id, &author_ids).await?;

        // 4. Favoris / panier du lecteur
        let (favorited, in_cart) = match viewer_id {
            Some(viewer_id) => {
                let favorited: Vec<i32> = favorite::Entity::find()
                    .select_only()
                    .column(favorite::Column::RecipeId)
                    .filter(favorite::Column::UserId.eq(viewer_id))
                    .filter(favorite::Column::RecipeId.is_in(recipe_ids.clone()))
                    .into_tuple()
                    .all(db)
                    .await?;
                let in_cart: Vec<i32> = shopping_cart::Entity::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(viewer_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.clone()))
                    .into_tuple()
                    .all(db)
                    .await?;
                (
                    favorited.into_iter().collect::<HashSet<i32>>(),
                    in_cart.into_iter().collect::<HashSet<i32>>(),
                )
            }
            None => (HashSet::new(), HashSet::new()),
        };

        // 5. Réponse finale, dans l'ordre d'entrée
        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).ok_or_else(|| {
                    AppError::Internal(format!("Author {} of recipe {} not found", recipe.author_id, recipe.id))
                })?;

                Ok(RecipeResponse {
                    id: recipe.id,
                    tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    author: UserService::to_response(author, subscribed.contains(&author.id)),
                    ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    image: media::image_url(media_url, &recipe.image),
                    name: recipe.name,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams(
            pairs
                .iter()
                .map(|(k, v)| (ToString::to_string(k), ToString::to_string(v)))
                .collect(),
        )
    }

    #[test]
    fn test_filter_from_params() {
        let filter = RecipeFilter::from_params(&params(&[
            ("tags", "breakfast"),
            ("tags", "vegan"),
            ("author", "7"),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
        ]))
        .unwrap();

        assert_eq!(
            filter,
            RecipeFilter {
                tags: vec!["breakfast".to_string(), "vegan".to_string()],
                author: Some(7),
                is_favorited: true,
                is_in_shopping_cart: false,
            }
        );
    }

    #[test]
    fn test_filter_rejects_non_numeric_author() {
        assert!(RecipeFilter::from_params(&params(&[("author", "bob")])).is_err());
    }
}
