use sha2::{Digest, Sha256};

use crate::data_uri::data_uri_mime;

/// Deterministic export filename for a gallery item:
/// `studio-gallery-{position}--{short_hash(data_uri)}.{ext}`.
pub fn gallery_filename(position: usize, data_uri: &str) -> String {
    let ext = data_uri_mime(data_uri)
        .map(extension_for)
        .unwrap_or("bin");
    format!("studio-gallery-{position}--{}.{ext}", short_hash(data_uri))
}

fn extension_for(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
