//! Product image uploads.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Build the stored filename for an uploaded image.
///
/// The client filename contributes only a vetted extension; everything
/// else is replaced by a random name, so path traversal in the original
/// name is harmless.
///
/// # Errors
///
/// Returns `AppError::Validation` if the extension is missing or not an
/// image type we accept.
pub fn stored_filename(original_name: &str) -> Result<String, AppError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| {
            AppError::Validation("Image must be a .jpg, .jpeg, .png, .webp, or .gif file".to_owned())
        })?;
    Ok(format!("product_{}.{extension}", Uuid::new_v4().simple()))
}

/// Persist an uploaded image under the upload directory, enforcing the
/// size cap, and return the stored filename.
///
/// # Errors
///
/// Returns `AppError::Validation` for oversized or wrongly-typed files,
/// `AppError::Internal` if the write fails.
pub async fn save_image(
    upload_dir: &Path,
    max_bytes: u64,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    if bytes.len() as u64 > max_bytes {
        return Err(AppError::Validation(format!(
            "Image is too large (limit is {} MiB)",
            max_bytes / (1024 * 1024)
        )));
    }
    let filename = stored_filename(original_name)?;
    let path: PathBuf = upload_dir.join(&filename);

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| AppError::Internal(format!("failed to create {}: {e}", path.display())))?;
    file.write_all(bytes)
        .await
        .map_err(|e| AppError::Internal(format!("failed to write {}: {e}", path.display())))?;

    Ok(filename)
}

/// Create the upload directory if it does not exist yet.
///
/// # Errors
///
/// Returns `AppError::Internal` if the directory cannot be created.
pub async fn ensure_upload_dir(upload_dir: &Path) -> Result<(), AppError> {
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        AppError::Internal(format!(
            "failed to create upload dir {}: {e}",
            upload_dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_randomized_and_keep_the_extension() {
        let a = stored_filename("menu photo.JPG").unwrap();
        let b = stored_filename("menu photo.JPG").unwrap();
        assert!(a.starts_with("product_"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn traversal_in_the_client_name_is_discarded() {
        let name = stored_filename("../../etc/passwd.png").unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn non_image_extensions_are_rejected() {
        assert!(stored_filename("shell.sh").is_err());
        assert!(stored_filename("noextension").is_err());
        assert!(stored_filename("double.png.exe").is_err());
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected() {
        let dir = std::env::temp_dir();
        let result = save_image(&dir, 4, "photo.png", &[0_u8; 5]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn images_are_written_to_disk() {
        let dir = std::env::temp_dir();
        let name = save_image(&dir, 1024, "photo.png", b"fakepng").await.unwrap();
        let written = tokio::fs::read(dir.join(&name)).await.unwrap();
        assert_eq!(written, b"fakepng");
        let _ = tokio::fs::remove_file(dir.join(&name)).await;
    }
}
