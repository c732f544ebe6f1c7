use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use rand::{distributions::Alphanumeric, Rng};
use base64::{Engine, engine::general_purpose::STANDARD};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "pbkdf2_sha256";
pub const ITERATIONS: u32 = 390000;
const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 22;

/// Hash un mot de passe au format Django (compatible avec les comptes existants)
/// Format: pbkdf2_sha256$iterations$salt$hash_base64
pub fn hash_password_with_iterations(password: &str, iterations: u32) -> Result<String, String> {
    // Salt alphanumérique, comme Django
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect();

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key)
        .map_err(|e| format!("PBKDF2 hash generation failed: {}", e))?;

    Ok(format!("{}${}${}${}", ALGORITHM, iterations, salt, STANDARD.encode(key)))
}

/// Vérifie un mot de passe contre un hash pbkdf2_sha256
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    // Parser le format: algorithm$iterations$salt$hash
    let parts: Vec<&str> = stored_hash.split('$').collect();
    if parts.len() != 4 {
        return Err("Invalid hash format".to_string());
    }

    if parts[0] != ALGORITHM {
        return Err(format!("Unsupported algorithm: {}", parts[0]));
    }

    let iterations = parts[1]
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;
    let salt = parts[2];
    let expected_hash = STANDARD
        .decode(parts[3])
        .map_err(|e| format!("Base64 decode failed: {}", e))?;

    let mut computed = vec![0u8; expected_hash.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut computed)
        .map_err(|e| format!("PBKDF2 hash verification failed: {}", e))?;

    Ok(constant_time_eq(&computed, &expected_hash))
}

// Comparaison en temps constant (évite les timing attacks)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
