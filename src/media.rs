use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use rocket::tokio;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::store::Store;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMedia {
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// External media hosting. Given bytes, returns a durable absolute URL.
#[rocket::async_trait]
pub trait MediaHost: Send + Sync {
    fn name(&self) -> &'static str;
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, filename: &str) -> Result<HostedMedia>;
}

/// Pick the configured host. Falls back to local storage when Cloudinary is
/// selected but its credentials are missing.
pub fn from_settings(store: &dyn Store) -> Arc<dyn MediaHost> {
    if store.setting_get_or("media_backend", "local") == "cloudinary" {
        match CloudinaryHost::from_env() {
            Some(host) => return Arc::new(host),
            None => log::warn!(
                "media_backend=cloudinary but CLOUDINARY_* env vars are missing, using local uploads"
            ),
        }
    }
    Arc::new(LocalMediaHost::from_settings(store))
}

// ── Local disk ──────────────────────────────────────────

pub struct LocalMediaHost {
    pub storage_path: PathBuf,
    pub public_base: String,
    pub thumb_size: (u32, u32),
}

impl LocalMediaHost {
    pub fn from_settings(store: &dyn Store) -> Self {
        let site_url = store.setting_get_or("site_url", "http://localhost:8000");
        LocalMediaHost {
            storage_path: PathBuf::from(store.setting_get_or("uploads_path", "website/uploads/")),
            public_base: format!("{}/uploads", site_url.trim_end_matches('/')),
            thumb_size: parse_dimensions(&store.setting_get_or("thumb_size", "600x600")),
        }
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base, name)
    }
}

#[rocket::async_trait]
impl MediaHost for LocalMediaHost {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, bytes: Vec<u8>, content_type: &str, filename: &str) -> Result<HostedMedia> {
        let ext = extension_for(filename, content_type);
        let unique_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let full = self.storage_path.join(&unique_name);

        tokio::fs::create_dir_all(&self.storage_path)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        tokio::fs::write(&full, &bytes)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let mut thumbnail_url = None;
        if content_type.starts_with("image/") {
            let thumb_name = format!("thumb_{}", unique_name);
            let thumb_full = self.storage_path.join(&thumb_name);
            let (w, h) = self.thumb_size;
            let made = tokio::task::spawn_blocking(move || write_thumbnail(&bytes, &thumb_full, w, h))
                .await
                .map_err(|e| e.to_string())
                .and_then(|r| r);
            match made {
                Ok(()) => thumbnail_url = Some(self.public_url(&thumb_name)),
                Err(e) => log::warn!("Thumbnail generation failed for {}: {}", unique_name, e),
            }
        }

        Ok(HostedMedia {
            url: self.public_url(&unique_name),
            thumbnail_url,
        })
    }
}

fn write_thumbnail(bytes: &[u8], dest: &Path, w: u32, h: u32) -> std::result::Result<(), String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let thumbnail = img.resize(w, h, FilterType::Lanczos3);
    thumbnail.save(dest).map_err(|e| e.to_string())
}

fn extension_for(filename: &str, content_type: &str) -> String {
    let from_name = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    match from_name {
        Some(e) => e.to_ascii_lowercase(),
        None => content_type
            .split('/')
            .nth(1)
            .map(|sub| sub.split(';').next().unwrap_or(sub).trim())
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
            .to_string(),
    }
}

fn parse_dimensions(s: &str) -> (u32, u32) {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() == 2 {
        let w = parts[0].trim().parse().unwrap_or(600);
        let h = parts[1].trim().parse().unwrap_or(600);
        (w, h)
    } else {
        (600, 600)
    }
}

// ── Cloudinary ──────────────────────────────────────────

/// Signed uploads to Cloudinary. Signatures use SHA-256, so the account's
/// signature algorithm must be set to SHA-256.
pub struct CloudinaryHost {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        CloudinaryHost {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            folder: "portfolio".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let cloud = std::env::var("CLOUDINARY_CLOUD_NAME").ok()?;
        let key = std::env::var("CLOUDINARY_API_KEY").ok()?;
        let secret = std::env::var("CLOUDINARY_API_SECRET").ok()?;
        if cloud.is_empty() || key.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self::new(&cloud, &key, &secret))
    }

    /// Parameters are signed in alphabetical order with the secret appended.
    fn signature(&self, timestamp: i64) -> String {
        let to_sign = format!("folder={}&timestamp={}{}", self.folder, timestamp, self.api_secret);
        hex::encode(Sha256::digest(to_sign.as_bytes()))
    }
}

#[rocket::async_trait]
impl MediaHost for CloudinaryHost {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, bytes: Vec<u8>, content_type: &str, filename: &str) -> Result<HostedMedia> {
        let timestamp = chrono::Utc::now().timestamp();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.folder.clone())
            .text("signature", self.signature(timestamp))
            .text("signature_algorithm", "sha256");

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/auto/upload",
            self.cloud_name
        );
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!("cloudinary returned {}: {}", status, body)));
        }

        let uploaded: CloudinaryUpload = resp
            .json()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        Ok(HostedMedia {
            url: uploaded.secure_url,
            thumbnail_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_prefers_filename() {
        assert_eq!(extension_for("clip.MP4", "video/mp4"), "mp4");
        assert_eq!(extension_for("noext", "image/png"), "png");
        assert_eq!(extension_for("noext", "video/webm; codecs=vp9"), "webm");
        assert_eq!(extension_for("weird.../", ""), "bin");
    }

    #[test]
    fn dimensions_fall_back() {
        assert_eq!(parse_dimensions("300x200"), (300, 200));
        assert_eq!(parse_dimensions("garbage"), (600, 600));
    }

    #[test]
    fn cloudinary_signature_is_stable() {
        let host = CloudinaryHost::new("demo", "key", "secret");
        let a = host.signature(1_700_000_000);
        assert_eq!(a, host.signature(1_700_000_000));
        assert_eq!(a.len(), 64);
        assert_ne!(a, host.signature(1_700_000_001));
    }
}
