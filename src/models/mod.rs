// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (email + mot de passe, token_version pour le logout)
//   - tag : Tags de recettes (nom, couleur #RRGGBB, slug)
//   - ingredient : Ingrédients (nom, unité de mesure)
//   - recipe : Recettes publiées par un auteur
//   - recipe_ingredient : Lignes ingrédient d'une recette (avec quantité)
//   - recipe_tag : Jointure recette <-> tag
//   - favorite : Recettes favorites d'un utilisateur
//   - shopping_cart : Panier (recettes dont on agrège les ingrédients)
//   - subscription : Abonnements utilisateur -> auteur
//   - dto : Data Transfer Objects (requêtes et réponses API)
//
// Points d'attention:
//   - Les paires (user, recipe) / (user, author) sont uniques en base
//     (index créés par db::create_schema)
//   - Supprimer une recette supprime ses lignes liées (CASCADE)
//
// ============================================================================

pub mod health;
pub mod users;
pub mod tag;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod favorite;
pub mod shopping_cart;
pub mod subscription;
pub mod dto;
