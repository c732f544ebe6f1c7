// Images des recettes : data URI base64 -> fichier sous MEDIA_ROOT/recipes/

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use uuid::Uuid;

use crate::error::AppError;

const UPLOAD_DIR: &str = "recipes";

#[derive(Debug, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Décode "data:image/<type>;base64,<payload>"
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, AppError> {
    let invalid = || AppError::field("image", "Upload a valid image. The file is not a base64 encoded image.");

    let (header, payload) = data.split_once(',').ok_or_else(invalid)?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|h| h.strip_suffix(";base64"))
        .ok_or_else(invalid)?;

    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return Err(invalid()),
    };

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(AppError::field("image", "The submitted file is empty."));
    }

    Ok(DecodedImage { bytes, extension })
}

/// Écrit l'image et retourne son chemin relatif (stocké en base)
pub async fn save_image(media_root: &Path, image: &DecodedImage) -> Result<String, AppError> {
    let dir = media_root.join(UPLOAD_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
    tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

    Ok(format!("{}/{}", UPLOAD_DIR, file_name))
}

/// Suppression best-effort (un fichier manquant n'est pas une erreur)
pub async fn remove_image(media_root: &Path, relative_path: &str) {
    if relative_path.is_empty() {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(media_root.join(relative_path)).await {
        tracing::warn!("Failed to remove image {}: {}", relative_path, e);
    }
}

pub fn image_url(media_url: &str, relative_path: &str) -> String {
    format!("{}{}", media_url, relative_path)
}
