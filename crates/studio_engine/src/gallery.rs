//! Gallery persistence: an ordered list of media data URIs stored as one
//! JSON array under [`GALLERY_KEY`].

use studio_logging::{studio_info, studio_warn};

use crate::store::{KeyValueStore, StoreError};

pub const GALLERY_KEY: &str = "studio-gallery";

/// Parses a stored gallery value. Duplicates are dropped, first occurrence wins.
pub fn decode_gallery(raw: &str) -> Result<Vec<String>, StoreError> {
    let items: Vec<String> =
        serde_json::from_str(raw).map_err(|err| StoreError::Corrupt {
            key: GALLERY_KEY.to_string(),
            message: err.to_string(),
        })?;
    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    Ok(unique)
}

/// Best-effort load. Missing, unreadable or corrupt values yield an empty gallery.
pub fn load_gallery(store: &dyn KeyValueStore) -> Vec<String> {
    let raw = match store.get(GALLERY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            studio_warn!("Could not read gallery: {}", err);
            return Vec::new();
        }
    };
    match decode_gallery(&raw) {
        Ok(items) => {
            studio_info!("Loaded {} gallery items", items.len());
            items
        }
        Err(err) => {
            studio_warn!("Starting with an empty gallery: {}", err);
            Vec::new()
        }
    }
}

pub fn save_gallery(store: &mut dyn KeyValueStore, items: &[String]) -> Result<(), StoreError> {
    let raw = serde_json::to_string(items).map_err(|err| StoreError::Serialize(err.to_string()))?;
    store.set(GALLERY_KEY, raw)
}
