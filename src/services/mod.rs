// ============================================================================
// SERVICES
// ============================================================================
//
// Logique métier, appelée par les routes. Chaque service est une struct sans
// état dont les fonctions prennent la connexion en paramètre.
//
//   - user_service : inscription, login, mot de passe, vues utilisateur
//   - catalog_service : tags et ingrédients (lecture seule)
//   - recipe_service : CRUD recettes + filtres + vues batchées
//   - collection_service : favoris et panier (trait RecipeCollection)
//   - shopping_list_service : agrégation du panier + export .xlsx
//   - subscription_service : abonnements aux auteurs
//
// ============================================================================

pub mod catalog_service;
pub mod collection_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod subscription_service;
pub mod user_service;
