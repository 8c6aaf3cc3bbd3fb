//! Like/unlike toggles and share events for portfolio items.
//!
//! Each actor holds at most one live like per item: liking twice is a no-op and
//! unliking removes that single row. Shares are plain append-only events.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::engagement::{LikeAction, ShareMethod};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub like_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCount {
    pub share_count: i64,
}

pub fn parse_action(raw: Option<&str>) -> Result<LikeAction> {
    match raw {
        Some(s) => s.trim().parse(),
        None => Err(AppError::Validation("missing like action".to_string())),
    }
}

/// A missing method falls back to "copy", the clipboard path every client supports.
pub fn parse_method(raw: Option<&str>) -> Result<ShareMethod> {
    match raw {
        Some(s) => s.trim().parse(),
        None => Ok(ShareMethod::Copy),
    }
}

pub fn get_like_state(store: &dyn Store, item_id: &str, actor: &str) -> Result<LikeState> {
    if !store.item_exists(item_id)? {
        return Err(AppError::NotFound(item_id.to_string()));
    }
    like_state(store, item_id, actor)
}

fn like_state(store: &dyn Store, item_id: &str, actor: &str) -> Result<LikeState> {
    Ok(LikeState {
        like_count: store.like_count(item_id)?,
        is_liked: store.like_exists(item_id, actor)?,
    })
}

/// Apply a like or unlike for `actor` and return the state the caller should display.
pub fn toggle_like(
    store: &dyn Store,
    item_id: &str,
    actor: &str,
    user_agent: Option<&str>,
    action: LikeAction,
) -> Result<LikeState> {
    match action {
        LikeAction::Like => {
            if !store.like_add(item_id, actor, user_agent)? {
                log::debug!("duplicate like ignored for {}", item_id);
            }
        }
        LikeAction::Unlike => {
            if !store.item_exists(item_id)? {
                return Err(AppError::NotFound(item_id.to_string()));
            }
            store.like_remove(item_id, actor)?;
        }
    }
    like_state(store, item_id, actor)
}

pub fn record_share(
    store: &dyn Store,
    item_id: &str,
    actor: &str,
    user_agent: Option<&str>,
    method: ShareMethod,
) -> Result<()> {
    store.share_add(item_id, actor, user_agent, method)?;
    Ok(())
}

pub fn get_share_count(store: &dyn Store, item_id: &str) -> Result<ShareCount> {
    Ok(ShareCount {
        share_count: store.share_count(item_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_action_accepts_known_values() {
        assert_eq!(parse_action(Some("like")).unwrap(), LikeAction::Like);
        assert_eq!(parse_action(Some(" unlike ")).unwrap(), LikeAction::Unlike);
    }

    #[test]
    fn parse_action_rejects_unknown_or_missing() {
        assert!(matches!(parse_action(Some("love")), Err(AppError::Validation(_))));
        assert!(matches!(parse_action(None), Err(AppError::Validation(_))));
    }

    #[test]
    fn parse_method_defaults_to_copy() {
        assert_eq!(parse_method(None).unwrap(), ShareMethod::Copy);
        assert_eq!(parse_method(Some("native")).unwrap(), ShareMethod::Native);
        assert!(matches!(parse_method(Some("email")), Err(AppError::Validation(_))));
    }
}
