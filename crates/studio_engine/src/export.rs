use std::path::{Path, PathBuf};

use serde_json::json;
use studio_logging::{studio_info, studio_warn};

use crate::data_uri::{decode_data_uri, DataUriError};
use crate::filename::gallery_filename;
use crate::persist::{AtomicFileWriter, PersistError};

pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Positions (1-based) of items that were not valid base64 data URIs.
    pub skipped: Vec<usize>,
    pub manifest_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Writes every gallery item as a media file into `dir`, plus a manifest.
/// Items that cannot be decoded are skipped and reported.
pub fn export_gallery(items: &[String], dir: &Path) -> Result<ExportSummary, ExportError> {
    let writer = AtomicFileWriter::new(dir);
    let mut written = Vec::new();
    let mut skipped = Vec::new();
    let mut files = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let position = index + 1;
        let decoded = match decode_data_uri(item) {
            Ok(decoded) => decoded,
            Err(err) => {
                log_skip(position, &err);
                skipped.push(position);
                continue;
            }
        };
        let filename = gallery_filename(position, item);
        let path = writer.write(&filename, &decoded.bytes)?;
        files.push(json!({
            "position": position,
            "filename": filename,
            "mime_type": decoded.mime_type,
            "bytes": decoded.bytes.len(),
        }));
        written.push(path);
    }

    let manifest = json!({
        "item_count": items.len(),
        "written": written.len(),
        "skipped": skipped,
        "files": files,
    });
    let manifest_path = writer.write(MANIFEST_FILENAME, manifest.to_string())?;
    studio_info!(
        "Exported {} gallery items to {} ({} skipped)",
        written.len(),
        dir.display(),
        skipped.len()
    );

    Ok(ExportSummary {
        written,
        skipped,
        manifest_path,
    })
}

fn log_skip(position: usize, err: &DataUriError) {
    studio_warn!("Skipping gallery item {}: {}", position, err);
}
