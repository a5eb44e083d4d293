//! Media type detection for picked and dropped files.

/// Used when neither the source, the extension nor the content identify the file.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Resolves a media type: reported type first, then the file extension,
/// then a sniff of the leading bytes.
pub fn resolve_media_type(file_name: &str, reported: Option<&str>, bytes: &[u8]) -> String {
    if let Some(reported) = reported.map(str::trim).filter(|m| !m.is_empty()) {
        return reported.to_ascii_lowercase();
    }
    if let Some(guess) = mime_guess::from_path(file_name).first_raw() {
        return guess.to_string();
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => FALLBACK_MEDIA_TYPE.to_string(),
    }
}

pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}
