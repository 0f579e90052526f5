use std::fs;
use std::path::Path;

use anyhow::Context;
use studio_engine::{encode_data_uri, load_gallery, save_gallery, FileStore};
use studio_logging::{studio_error, studio_info};

pub(crate) fn open_store(data_dir: &Path) -> anyhow::Result<FileStore> {
    FileStore::open(data_dir)
        .with_context(|| format!("failed to open store in {}", data_dir.display()))
}

/// Gallery items from the store; never fails.
pub(crate) fn load_saved_gallery(store: &FileStore) -> Vec<String> {
    let items = load_gallery(store);
    studio_info!("Gallery restored from {}", store.path().display());
    items
}

pub(crate) fn persist_gallery(store: &mut FileStore, items: &[String]) {
    if let Err(err) = save_gallery(store, items) {
        studio_error!(
            "Failed to persist gallery to {}: {}",
            store.path().display(),
            err
        );
    }
}

/// Reads an image file into a data URI. The media type comes from the file extension.
pub(crate) fn read_image(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    };
    Ok(encode_data_uri(&bytes, mime))
}
