use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

use crate::models::users;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub username: String,
    pub ver: i32,        // token_version de l'utilisateur à l'émission
    pub exp: i64,        // expiration timestamp
}

/// Génère un JWT token pour un utilisateur
pub fn generate_token(user: &users::Model, secret: &str, ttl_hours: i64) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        ver: user.token_version,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie et décode un JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(token_version: i32) -> users::Model {
        users::Model {
            id: 123,
            email: "cook@example.com".to_string(),
            username: "testuser".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: String::new(),
            token_version,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let token = generate_token(&user(3), "secret", 24).unwrap();
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.ver, 3);
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("invalid.token.here", "secret");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let token = generate_token(&user(0), "secret", 24).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token() {
        // Au-delà de la marge (leeway) par défaut de 60s
        let token = generate_token(&user(0), "secret", -2).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
