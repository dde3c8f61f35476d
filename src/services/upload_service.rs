use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    utils::multipart::UploadedFile,
};

pub const PUBLIC_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Image files stored on local disk and served under `/uploads/`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Writes the file under a fresh name and returns its public path.
    pub async fn save(&self, file: &UploadedFile) -> Result<String> {
        let extension = image_extension(file)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), &file.bytes).await?;

        tracing::info!("Stored upload {} ({} bytes)", file_name, file.bytes.len());

        Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
    }

    /// Deletes the file behind a public path. Missing files are not an error.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!("Refusing to delete unexpected upload path {}", public_path);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Deleted upload {}", public_path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to delete upload {}: {}", public_path, e),
        }
    }

    pub async fn remove_all(&self, public_paths: &[String]) {
        for path in public_paths {
            self.remove(path).await;
        }
    }

    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX)?;
        let is_plain_name = !name.is_empty()
            && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);

        is_plain_name.then(|| self.root.join(name))
    }
}

fn image_extension(file: &UploadedFile) -> Result<&'static str> {
    let from_name = file
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| ALLOWED_EXTENSIONS.iter().find(|allowed| **allowed == ext).copied());

    let from_content_type = match file.content_type.as_deref() {
        Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
        Some("image/png") => Some("png"),
        Some("image/webp") => Some("webp"),
        Some("image/gif") => Some("gif"),
        _ => None,
    };

    from_name
        .or(from_content_type)
        .ok_or_else(|| AppError::BadRequest("Only image files are allowed".to_string()))
}
