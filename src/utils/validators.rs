// Règles de validation partagées entre DTOs, services et CLI

use std::borrow::Cow;
use std::collections::HashSet;

use validator::ValidationError;

use crate::error::{push_error, FieldErrors, REQUIRED_FIELD};
use crate::models::dto::IngredientAmountRequest;

/// Nom d'utilisateur : lettres, chiffres et @/./+/-/_ uniquement, et pas "me"
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let invalid: Vec<String> = username
        .chars()
        .filter(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')))
        .map(String::from)
        .collect();

    if !invalid.is_empty() {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some(Cow::Owned(format!(
            "Username contains invalid characters: {}",
            invalid.join(", ")
        )));
        return Err(error);
    }

    if username.eq_ignore_ascii_case("me") {
        let mut error = ValidationError::new("reserved_username");
        error.message = Some(Cow::Borrowed("Username cannot be \"me\"."));
        return Err(error);
    }

    Ok(())
}

/// Couleur d'un tag : #RRGGBB
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Vérifie la liste d'ids de tags (présence, non vide, sans doublon).
/// L'existence en base est vérifiée par le service.
pub fn check_tag_ids(tags: Option<&[i32]>, errors: &mut FieldErrors) {
    let Some(tags) = tags else {
        push_error(errors, "tags", REQUIRED_FIELD);
        return;
    };

    if tags.is_empty() {
        push_error(errors, "tags", "At least one tag is required.");
        return;
    }

    let mut seen = HashSet::new();
    for id in tags {
        if !seen.insert(*id) {
            push_error(errors, "tags", format!("Tag {} is listed more than once.", id));
        }
    }
}

/// Vérifie les lignes ingrédient (présence, non vide, sans doublon, quantité >= 1)
pub fn check_ingredient_amounts(ingredients: Option<&[IngredientAmountRequest]>, errors: &mut FieldErrors) {
    let Some(ingredients) = ingredients else {
        push_error(errors, "ingredients", REQUIRED_FIELD);
        return;
    };

    if ingredients.is_empty() {
        push_error(errors, "ingredients", "At least one ingredient is required.");
        return;
    }

    let mut seen = HashSet::new();
    for item in ingredients {
        if !seen.insert(item.id) {
            push_error(
                errors,
                "ingredients",
                format!("Ingredient {} is listed more than once.", item.id),
            );
        }
        if item.amount < 1 || item.amount > i64::from(i16::MAX) {
            push_error(
                errors,
                "ingredients",
                format!("Amount of ingredient {} must be between 1 and 32767.", item.id),
            );
        }
    }
}
