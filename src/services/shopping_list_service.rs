// ============================================================================
// LISTE DE COURSES
// ============================================================================
//
// Agrège les ingrédients de toutes les recettes du panier d'un utilisateur:
//   SUM(amount) GROUP BY (nom, unité), trié par nom
// puis génère un classeur .xlsx (feuille "Shopping List").
//
// ============================================================================

use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::error::AppError;
use crate::models::{ingredient, recipe, recipe_ingredient, shopping_cart};

const SHEET_NAME: &str = "Shopping List";
const HEADERS: [&str; 3] = ["Ingredient", "Measurement Unit", "Total Amount"];

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

pub struct ShoppingListService;

impl ShoppingListService {
    /// Une seule requête groupée, aucune agrégation en mémoire
    pub async fn items(db: &DatabaseConnection, user_id: i32) -> Result<Vec<ShoppingListItem>, DbErr> {
        recipe_ingredient::Entity::find()
            .select_only()
            .column_as(ingredient::Column::Name, "name")
            .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
            .column_as(
                Expr::col((recipe_ingredient::Entity, recipe_ingredient::Column::Amount)).sum(),
                "total_amount",
            )
            .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
            .join(JoinType::InnerJoin, recipe_ingredient::Relation::Recipe.def())
            .join(JoinType::InnerJoin, recipe::Relation::ShoppingCart.def())
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .group_by(ingredient::Column::Name)
            .group_by(ingredient::Column::MeasurementUnit)
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::MeasurementUnit)
            .into_model::<ShoppingListItem>()
            .all(db)
            .await
    }

    /// Classeur + nom de fichier horodaté
    pub async fn download(db: &DatabaseConnection, user_id: i32) -> Result<(String, Vec<u8>), AppError> {
        let items = Self::items(db, user_id).await?;
        let bytes = render_workbook(&items)?;

        let file_name = format!("shopping_lists_{}.xlsx", Utc::now().format("%Y-%m-%d_%H-%M-%S"));
        tracing::info!(
            "Shopping list generated for user {} ({} ingredients)",
            user_id,
            items.len()
        );
        Ok((file_name, bytes))
    }
}

pub fn render_workbook(items: &[ShoppingListItem]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, item) in items.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &item.name)?;
        worksheet.write_string(row, 1, &item.measurement_unit)?;
        worksheet.write_number(row, 2, item.total_amount as f64)?;
    }

    worksheet.set_column_width(0, 40)?;
    worksheet.set_column_width(1, 20)?;
    worksheet.set_column_width(2, 15)?;

    workbook.save_to_buffer()
}
