//! Shared setup for the HTTP integration tests.
//!
//! Each test gets a fresh in-memory SQLite database with the full schema,
//! a temporary media directory and factories for the main entities.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection};
use tempfile::TempDir;

use foodgram::config::AppConfig;
use foodgram::models::{ingredient, recipe, recipe_ingredient, recipe_tag, tag, users};
use foodgram::utils::{jwt, password};

pub const PASSWORD: &str = "s3cret-Passw0rd";
pub const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

static COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn next_id() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Builds the actix test service from a `TestContext`
#[macro_export]
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.db.clone()))
                .app_data(actix_web::web::Data::new($ctx.config.clone()))
                .configure(foodgram::routes::configure_routes),
        )
        .await
    };
}

pub struct TestContext {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub media: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("tempdir");
        let media_root = media.path().display().to_string();

        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            "JWT_SECRET" => Some("test-secret".to_string()),
            "MEDIA_ROOT" => Some(media_root.clone()),
            "PASSWORD_ITERATIONS" => Some("1000".to_string()),
            _ => None,
        })
        .expect("test config");

        let db = Database::connect(&config.database_url).await.expect("sqlite connection");
        foodgram::db::create_schema(&db).await.expect("schema");

        Self { db, config, media }
    }

    pub async fn user(&self, username: &str) -> users::Model {
        users::ActiveModel {
            email: Set(format!("{}@example.com", username)),
            username: Set(username.to_string()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            password_hash: Set(password::hash_password_with_iterations(PASSWORD, 1000).expect("hash")),
            token_version: Set(0),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert user")
    }

    pub fn token(&self, user: &users::Model) -> String {
        jwt::generate_token(user, &self.config.jwt_secret, 1).expect("token")
    }

    /// Valeur du header Authorization
    pub fn auth(&self, user: &users::Model) -> (&'static str, String) {
        ("Authorization", format!("Token {}", self.token(user)))
    }

    pub async fn tag(&self, slug: &str) -> tag::Model {
        let id = next_id();
        tag::ActiveModel {
            name: Set(format!("Tag {}", slug)),
            color: Set(format!("#{:06X}", id % 0xFFFFFF)),
            slug: Set(slug.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert tag")
    }

    pub async fn ingredient(&self, name: &str, unit: &str) -> ingredient::Model {
        ingredient::ActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(unit.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert ingredient")
    }

    /// Recette insérée directement en base (sans passer par l'API)
    pub async fn recipe(
        &self,
        author: &users::Model,
        name: &str,
        tags: &[i32],
        ingredients: &[(i32, i32)],
    ) -> recipe::Model {
        let recipe = recipe::ActiveModel {
            author_id: Set(author.id),
            name: Set(name.to_string()),
            image: Set(format!("recipes/{}.png", next_id())),
            text: Set("Mix everything.".to_string()),
            cooking_time: Set(10),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert recipe");

        for tag_id in tags {
            recipe_tag::ActiveModel {
                recipe_id: Set(recipe.id),
                tag_id: Set(*tag_id),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .expect("insert recipe tag");
        }

        for (ingredient_id, amount) in ingredients {
            recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe.id),
                ingredient_id: Set(*ingredient_id),
                amount: Set(*amount),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .expect("insert recipe ingredient");
        }

        recipe
    }
}
