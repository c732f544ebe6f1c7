use std::collections::HashSet;

use chrono::Utc;
use sea_orm::*;
use validator::Validate;

use crate::error::{field_errors_from, push_error, AppError, FieldErrors};
use crate::models::dto::{RegisterRequest, SetPasswordRequest, UserResponse};
use crate::models::{subscription, users};
use crate::utils::pagination::PageRequest;
use crate::utils::password;

pub struct UserService;

impl UserService {
    /// Inscription : valide le payload, vérifie l'unicité email/username, hash le mot de passe
    pub async fn register(
        db: &DatabaseConnection,
        request: RegisterRequest,
        password_iterations: u32,
    ) -> Result<users::Model, AppError> {
        let mut errors: FieldErrors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors_from(&e),
        };

        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(db)
            .await?
            .is_some();
        if email_taken {
            push_error(&mut errors, "email", "A user with that email already exists.");
        }

        let username_taken = users::Entity::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(db)
            .await?
            .is_some();
        if username_taken {
            push_error(&mut errors, "username", "A user with that username already exists.");
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = password::hash_password_with_iterations(&request.password, password_iterations)
            .map_err(AppError::Internal)?;

        let user = users::ActiveModel {
            email: Set(request.email),
            username: Set(request.username),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            password_hash: Set(password_hash),
            token_version: Set(0),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!("User registered: {} (id={})", user.username, user.id);
        Ok(user)
    }

    /// Vérifie email + mot de passe (login par token)
    pub async fn authenticate(db: &DatabaseConnection, email: &str, password_input: &str) -> Result<users::Model, AppError> {
        let invalid = || {
            AppError::field("non_field_errors", "Unable to log in with provided credentials.")
        };

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?
            .ok_or_else(invalid)?;

        match password::verify_password(password_input, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(invalid()),
            Err(e) => {
                tracing::warn!("Unreadable password hash for user {}: {}", user.id, e);
                Err(invalid())
            }
        }
    }

    pub async fn set_password(
        db: &DatabaseConnection,
        user: users::Model,
        request: SetPasswordRequest,
        password_iterations: u32,
    ) -> Result<(), AppError> {
        request.validate()?;

        let is_valid = password::verify_password(&request.current_password, &user.password_hash)
            .unwrap_or(false);
        if !is_valid {
            return Err(AppError::field("current_password", "Invalid password."));
        }

        let new_hash = password::hash_password_with_iterations(&request.new_password, password_iterations)
            .map_err(AppError::Internal)?;

        let mut active_model: users::ActiveModel = user.into();
        active_model.password_hash = Set(new_hash);
        active_model.update(db).await?;
        Ok(())
    }

    /// Logout : tous les tokens émis jusqu'ici deviennent invalides
    pub async fn revoke_tokens(db: &DatabaseConnection, user: users::Model) -> Result<(), AppError> {
        let next_version = user.token_version + 1;
        let mut active_model: users::ActiveModel = user.into();
        active_model.token_version = Set(next_version);
        active_model.update(db).await?;
        Ok(())
    }

    pub async fn get(db: &DatabaseConnection, user_id: i32) -> Result<users::Model, AppError> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(AppError::not_found)
    }

    pub async fn list(db: &DatabaseConnection, page: PageRequest) -> Result<(Vec<users::Model>, u64), AppError> {
        let paginator = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .paginate(db, page.limit);

        let count = paginator.num_items().await?;
        page.check_in_range(count)?;
        let rows = paginator.fetch_page(page.page_index()).await?;
        Ok((rows, count))
    }

    /// Ids des auteurs (parmi `author_ids`) suivis par le lecteur
    pub async fn subscribed_author_ids(
        db: &impl ConnectionTrait,
        viewer_id: Option<i32>,
        author_ids: &[i32],
    ) -> Result<HashSet<i32>, DbErr> {
        let Some(viewer_id) = viewer_id else {
            return Ok(HashSet::new());
        };
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = subscription::Entity::find()
            .select_only()
            .column(subscription::Column::AuthorId)
            .filter(subscription::Column::UserId.eq(viewer_id))
            .filter(subscription::Column::AuthorId.is_in(author_ids.to_vec()))
            .into_tuple()
            .all(db)
            .await?;

        Ok(ids.into_iter().collect())
    }

    pub fn to_response(user: &users::Model, is_subscribed: bool) -> UserResponse {
        UserResponse {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }

    /// Réponses pour une liste d'utilisateurs, is_subscribed calculé en UNE requête
    pub async fn to_responses(
        db: &DatabaseConnection,
        viewer_id: Option<i32>,
        users_list: &[users::Model],
    ) -> Result<Vec<UserResponse>, AppError> {
        let ids: Vec<i32> = users_list.iter().map(|u| u.id).collect();
        let subscribed = Self::subscribed_author_ids(db, viewer_id, &ids).await?;

        Ok(users_list
            .iter()
            .map(|u| Self::to_response(u, subscribed.contains(&u.id)))
            .collect())
    }
}
