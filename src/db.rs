// connexion BD + création du schéma

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::models::{favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, subscription, tag, users};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

async fn create_index(db: &DatabaseConnection, stmt: IndexCreateStatement) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Crée toutes les tables (IF NOT EXISTS) et les index d'unicité des paires.
/// Ordre = ordre des dépendances (FK).
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, tag::Entity).await?;
    create_table(db, &schema, ingredient::Entity).await?;
    create_table(db, &schema, recipe::Entity).await?;
    create_table(db, &schema, recipe_tag::Entity).await?;
    create_table(db, &schema, recipe_ingredient::Entity).await?;
    create_table(db, &schema, favorite::Entity).await?;
    create_table(db, &schema, shopping_cart::Entity).await?;
    create_table(db, &schema, subscription::Entity).await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("uq_recipe_tags_recipe_tag")
            .table(recipe_tag::Entity)
            .col(recipe_tag::Column::RecipeId)
            .col(recipe_tag::Column::TagId)
            .unique()
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("uq_recipe_ingredients_recipe_ingredient")
            .table(recipe_ingredient::Entity)
            .col(recipe_ingredient::Column::RecipeId)
            .col(recipe_ingredient::Column::IngredientId)
            .unique()
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("uq_favorites_user_recipe")
            .table(favorite::Entity)
            .col(favorite::Column::UserId)
            .col(favorite::Column::RecipeId)
            .unique()
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("uq_shopping_carts_user_recipe")
            .table(shopping_cart::Entity)
            .col(shopping_cart::Column::UserId)
            .col(shopping_cart::Column::RecipeId)
            .unique()
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("uq_subscriptions_user_author")
            .table(subscription::Entity)
            .col(subscription::Column::UserId)
            .col(subscription::Column::AuthorId)
            .unique()
            .to_owned(),
    )
    .await?;

    tracing::info!("Database schema ready");
    Ok(())
}
