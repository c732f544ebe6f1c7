// ============================================================================
// MANAGE - commandes d'administration
// ============================================================================
//
//   manage create-schema
//   manage import-ingredients data/ingredients.json   (ou .csv "nom,unité")
//   manage import-tags data/tags.json
//   manage clear-ingredients
//
// DATABASE_URL est lu depuis le .env (ou --database-url).
//
// ============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sea_orm::*;
use serde::Deserialize;
use thiserror::Error;

use foodgram::db;
use foodgram::models::{ingredient, recipe_ingredient, tag};
use foodgram::utils::validators::is_hex_color;

#[derive(Parser)]
#[command(name = "manage", about = "Foodgram administration commands")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crée les tables et index (idempotent)
    CreateSchema,
    /// Importe des ingrédients [{name, measurement_unit}]
    ImportIngredients { file: PathBuf },
    /// Importe des tags [{name, color, slug}]
    ImportTags { file: PathBuf },
    /// Supprime tous les ingrédients (et les lignes de recettes associées)
    ClearIngredients,
}

#[derive(Debug, Error)]
enum ManageError {
    #[error("cannot read {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("invalid JSON in {path}: {source}")]
    Json { path: String, source: serde_json::Error },

    #[error("invalid CSV (expected \"name,measurement_unit\" rows): {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid color {color:?} for tag {slug:?} (expected #RRGGBB)")]
    Color { slug: String, color: String },

    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TagRecord {
    name: String,
    color: String,
    slug: String,
}

/// Objet simple ou entrée de fixture {"model": ..., "fields": {...}}
#[derive(Deserialize)]
#[serde(untagged)]
enum TagEntry {
    Fixture { fields: TagRecord },
    Plain(TagRecord),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("manage=info,foodgram=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ManageError> {
    let db = db::establish_connection(&cli.database_url).await?;

    match cli.command {
        Command::CreateSchema => {
            db::create_schema(&db).await?;
        }
        Command::ImportIngredients { file } => {
            let records = read_ingredients(&file)?;
            let inserted = import_ingredients(&db, records).await?;
            tracing::info!("Imported {} ingredients", inserted);
        }
        Command::ImportTags { file } => {
            let records = read_tags(&file)?;
            let inserted = import_tags(&db, records).await?;
            tracing::info!("Imported {} tags", inserted);
        }
        Command::ClearIngredients => {
            let txn = db.begin().await?;
            recipe_ingredient::Entity::delete_many().exec(&txn).await?;
            let result = ingredient::Entity::delete_many().exec(&txn).await?;
            txn.commit().await?;
            tracing::info!("Successfully cleared {} ingredients", result.rows_affected);
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String, ManageError> {
    std::fs::read_to_string(path).map_err(|source| ManageError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn read_ingredients(path: &Path) -> Result<Vec<IngredientRecord>, ManageError> {
    let content = read_file(path)?;
    if path.extension().is_some_and(|ext| ext == "csv") {
        return parse_ingredients_csv(&content);
    }
    serde_json::from_str(&content).map_err(|source| ManageError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Lignes "nom,unité" sans en-tête (guillemets et "" échappés acceptés)
fn parse_ingredients_csv(content: &str) -> Result<Vec<IngredientRecord>, ManageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let records = reader
        .deserialize::<IngredientRecord>()
        .collect::<Result<Vec<_>, csv::Error>>()?;
    Ok(records)
}

fn read_tags(path: &Path) -> Result<Vec<TagRecord>, ManageError> {
    let content = read_file(path)?;
    let entries: Vec<TagEntry> = serde_json::from_str(&content).map_err(|source| ManageError::Json {
        path: path.display().to_string(),
        source,
    })?;

    entries
        .into_iter()
        .map(|entry| {
            let record = match entry {
                TagEntry::Fixture { fields } => fields,
                TagEntry::Plain(record) => record,
            };
            if !is_hex_color(&record.color) {
                return Err(ManageError::Color {
                    slug: record.slug,
                    color: record.color,
                });
            }
            Ok(record)
        })
        .collect()
}

/// Garde la première occurrence de chaque clé absente de `existing`
fn new_records<T, F>(records: Vec<T>, existing: &HashSet<String>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let k = key(record);
            !existing.contains(&k) && seen.insert(k)
        })
        .collect()
}

async fn import_ingredients(db: &DatabaseConnection, records: Vec<IngredientRecord>) -> Result<usize, ManageError> {
    let existing: HashSet<String> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let fresh = new_records(records, &existing, |r| r.name.clone());
    let count = fresh.len();

    let txn = db.begin().await?;
    for chunk in fresh.chunks(500) {
        let rows: Vec<ingredient::ActiveModel> = chunk
            .iter()
            .map(|r| ingredient::ActiveModel {
                name: Set(r.name.clone()),
                measurement_unit: Set(r.measurement_unit.clone()),
                ..Default::default()
            })
            .collect();
        ingredient::Entity::insert_many(rows).exec(&txn).await?;
    }
    txn.commit().await?;
    Ok(count)
}

async fn import_tags(db: &DatabaseConnection, records: Vec<TagRecord>) -> Result<usize, ManageError> {
    let existing: HashSet<String> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Slug)
        .into_tuple::<String>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let fresh = new_records(records, &existing, |r| r.slug.clone());
    let count = fresh.len();

    let txn = db.begin().await?;
    for record in fresh {
        tag::ActiveModel {
            name: Set(record.name),
            color: Set(record.color),
            slug: Set(record.slug),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;
    Ok(count)
}
