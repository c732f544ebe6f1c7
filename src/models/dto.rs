//pour les requêtes et réponses structurées
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validators::validate_username;

// ----------------------------------------------------------------------------
// Utilisateurs
// ----------------------------------------------------------------------------

// DTO pour l'inscription
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."))]
    pub last_name: String,
    #[validate(length(min = 1, max = 128, message = "Ensure this field has between 1 and 128 characters."))]
    pub password: String,
}

// DTO pour la connexion (token)
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// DTO pour changer le mot de passe
#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    pub current_password: String,
    #[validate(length(min = 1, max = 128, message = "Ensure this field has between 1 and 128 characters."))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

// Réponse après inscription
#[derive(Debug, Serialize)]
pub struct RegisteredUserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Utilisateur tel que vu par le lecteur courant
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Auteur suivi, avec un aperçu de ses recettes
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: u64,
}

// ----------------------------------------------------------------------------
// Tags / ingrédients
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

// ----------------------------------------------------------------------------
// Recettes
// ----------------------------------------------------------------------------

/// Ligne ingrédient envoyée à la création/modification
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: i32,
    pub amount: i64,
}

/// Payload POST (tout requis) et PATCH (tout optionnel)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RecipeWriteRequest {
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>, // data:image/png;base64,....
    #[validate(length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 32767, message = "Ensure this value is between 1 and 32767."))]
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Forme courte (favoris, panier, abonnements)
#[derive(Debug, Clone, Serialize)]
pub struct RecipeShortResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}
