use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,
    #[error("data URI is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// `data:<mime>;base64,<payload>` for raw bytes.
pub fn encode_data_uri(bytes: &[u8], mime_type: &str) -> String {
    let encoded = BASE64.encode(bytes);
    encode_base64_data_uri(mime_type, &encoded)
}

/// Wraps an already base64-encoded payload.
pub fn encode_base64_data_uri(mime_type: &str, encoded: &str) -> String {
    format!("data:{mime_type};base64,{encoded}")
}

pub fn decode_data_uri(uri: &str) -> Result<DataUri, DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingScheme)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(DataUriError::NotBase64)?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|err| DataUriError::Payload(err.to_string()))?;
    Ok(DataUri {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// The base64 payload after the comma, as the API expects inline data.
pub fn base64_payload(uri: &str) -> &str {
    uri.split_once(',').map(|(_, payload)| payload).unwrap_or(uri)
}

/// MIME type declared in a data URI header, if any.
pub fn data_uri_mime(uri: &str) -> Option<&str> {
    let header = uri.strip_prefix("data:")?.split(',').next()?;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

/// Content-Type without parameters, or `fallback` when absent or generic.
pub fn payload_mime(content_type: Option<&str>, fallback: &str) -> String {
    content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
        .filter(|ct| !ct.is_empty() && !ct.eq_ignore_ascii_case("application/octet-stream"))
        .unwrap_or(fallback)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_keeps_bytes_and_mime() {
        let uri = encode_data_uri(b"\x00\x01video", "video/mp4");
        assert!(uri.starts_with("data:video/mp4;base64,"));
        let decoded = decode_data_uri(&uri).unwrap();
        assert_eq!(decoded.mime_type, "video/mp4");
        assert_eq!(decoded.bytes, b"\x00\x01video");
    }

    #[test]
    fn decode_rejects_non_base64_and_foreign_schemes() {
        assert_eq!(
            decode_data_uri("https://example.com/a.png"),
            Err(DataUriError::MissingScheme)
        );
        assert_eq!(
            decode_data_uri("data:text/plain,hello"),
            Err(DataUriError::NotBase64)
        );
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(DataUriError::Payload(_))
        ));
    }

    #[test]
    fn payload_and_mime_helpers() {
        let uri = "data:image/png;base64,QUJD";
        assert_eq!(base64_payload(uri), "QUJD");
        assert_eq!(data_uri_mime(uri), Some("image/png"));
        assert_eq!(data_uri_mime("data:;base64,QUJD"), None);
    }

    #[test]
    fn payload_mime_strips_params_and_falls_back() {
        assert_eq!(payload_mime(Some("video/MP4; codecs=avc1"), "video/mp4"), "video/mp4");
        assert_eq!(payload_mime(Some("application/octet-stream"), "video/mp4"), "video/mp4");
        assert_eq!(payload_mime(None, "video/mp4"), "video/mp4");
        assert_eq!(payload_mime(Some("video/webm"), "video/mp4"), "video/webm");
    }
}
