use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::media::MediaHost;
use crate::models::portfolio::{MediaKind, NewItem, PortfolioItem};
use crate::store::Store;

const MAX_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub item_id: String,
    pub likes_marked: usize,
    pub shares_marked: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub likes_marked: usize,
    pub shares_marked: usize,
}

pub fn validate_new_item(item: &NewItem) -> Result<()> {
    let id = item.id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("item id is required".to_string()));
    }
    if id.len() > MAX_ID_LEN || id.contains('/') || id != item.id {
        return Err(AppError::Validation(format!("invalid item id '{}'", item.id)));
    }
    validate_url("sourceUrl", &item.source_url)?;
    if let Some(thumb) = &item.thumbnail_url {
        validate_url("thumbnailUrl", thumb)?;
    }
    Ok(())
}

fn validate_url(field: &str, raw: &str) -> Result<()> {
    match url::Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host().is_some() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "{} must be an absolute http(s) URL",
            field
        ))),
    }
}

pub fn create_item(store: &dyn Store, item: NewItem) -> Result<PortfolioItem> {
    validate_new_item(&item)?;
    let created = store.item_create(&item)?;
    log::info!("Created portfolio item {} ({})", created.id, created.media_kind);
    Ok(created)
}

/// Upload bytes to the media host, then record the item under a generated id.
pub async fn create_uploaded_item(
    store: &dyn Store,
    host: &dyn MediaHost,
    bytes: Vec<u8>,
    content_type: &str,
    filename: &str,
) -> Result<PortfolioItem> {
    if bytes.is_empty() {
        return Err(AppError::Validation("no file provided".to_string()));
    }
    let media_kind = MediaKind::from_content_type(content_type)?;
    let hosted = host.upload(bytes, content_type, filename).await?;
    log::info!("Uploaded {} via {} host", filename, host.name());

    create_item(
        store,
        NewItem {
            id: upload_id(),
            media_kind,
            source_url: hosted.url,
            thumbnail_url: hosted.thumbnail_url,
        },
    )
}

/// `item-<millis>-<8 hex>`: sortable by time, unique within a millisecond.
fn upload_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("item-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

pub fn get_item(store: &dyn Store, item_id: &str) -> Result<PortfolioItem> {
    store
        .item_find(item_id)?
        .ok_or_else(|| AppError::NotFound(item_id.to_string()))
}

pub fn list_items(store: &dyn Store) -> Result<Vec<PortfolioItem>> {
    store.item_list()
}

/// Soft-mark the item's likes and shares, then remove the item. A second call
/// returns NotFound and mutates nothing.
pub fn delete_item(store: &dyn Store, item_id: &str) -> Result<DeletionReport> {
    let (likes_marked, shares_marked) = store.item_delete_cascade(item_id)?;
    log::info!(
        "Deleted portfolio item {} ({} likes, {} shares kept as history)",
        item_id,
        likes_marked,
        shares_marked
    );
    Ok(DeletionReport {
        item_id: item_id.to_string(),
        likes_marked,
        shares_marked,
    })
}

/// Repair pass for rows whose item vanished without the soft-delete step.
pub fn sweep_orphans(store: &dyn Store) -> Result<SweepReport> {
    let (likes_marked, shares_marked) = store.engagement_sweep_orphans()?;
    if likes_marked + shares_marked > 0 {
        log::info!(
            "Orphan sweep marked {} likes and {} shares",
            likes_marked,
            shares_marked
        );
    }
    Ok(SweepReport {
        likes_marked,
        shares_marked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, url: &str) -> NewItem {
        NewItem {
            id: id.to_string(),
            media_kind: MediaKind::Video,
            source_url: url.to_string(),
            thumbnail_url: None,
        }
    }

    #[test]
    fn accepts_absolute_urls() {
        assert!(validate_new_item(&item("item-1", "https://cdn.example.com/v.mp4")).is_ok());
    }

    #[test]
    fn rejects_relative_or_odd_urls() {
        for url in ["/uploads/v.mp4", "ftp://host/v.mp4", "not a url"] {
            assert!(matches!(
                validate_new_item(&item("item-1", url)),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_ids() {
        for id in ["", "  ", "a/b", " padded "] {
            assert!(matches!(
                validate_new_item(&item(id, "https://cdn.example.com/v.mp4")),
                Err(AppError::Validation(_))
            ));
        }
        let long = "x".repeat(MAX_ID_LEN + 1);
        assert!(validate_new_item(&item(&long, "https://cdn.example.com/v.mp4")).is_err());
    }
}
