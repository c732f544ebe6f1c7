// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Variables lues depuis l'environnement (après chargement du .env):
//   - DATABASE_URL  (obligatoire)
//   - JWT_SECRET    (défaut de dev, INSECURE)
//   - JWT_TTL_HOURS (défaut 24)
//   - HOST / PORT   (défaut 127.0.0.1:8080)
//   - MEDIA_ROOT    (défaut "media") : dossier où sont écrites les images
//   - MEDIA_URL     (défaut "/media/") : préfixe public des images
//   - PAGE_SIZE     (défaut 6)
//   - PASSWORD_ITERATIONS (défaut 390000) : itérations PBKDF2 des nouveaux hash
//
// ============================================================================

use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "default-insecure-key-change-this";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub host: String,
    pub port: u16,
    pub media_root: PathBuf,
    pub media_url: String,
    pub page_size: u64,
    pub password_iterations: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la config à partir d'une fonction de lookup (testable sans toucher à l'env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not found in .env, using default (INSECURE)");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let mut media_url = lookup("MEDIA_URL").unwrap_or_else(|| "/media/".to_string());
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        let page_size = parse_or("PAGE_SIZE", lookup("PAGE_SIZE"), 6u64)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", lookup("JWT_TTL_HOURS"), 24i64)?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", lookup("PORT"), 8080u16)?,
            media_root: PathBuf::from(lookup("MEDIA_ROOT").unwrap_or_else(|| "media".to_string())),
            media_url,
            page_size,
            password_iterations: parse_or(
                "PASSWORD_ITERATIONS",
                lookup("PASSWORD_ITERATIONS"),
                crate::utils::password::ITERATIONS,
            )?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
