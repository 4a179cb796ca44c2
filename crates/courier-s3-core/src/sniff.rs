//! Content type detection from leading bytes.

use mime::Mime;

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"\x1a\x45\xdf\xa3", "video/webm"),
    (b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
];

/// Bytes inspected by the text heuristics.
const TEXT_SAMPLE: usize = 8 * 1024;

/// Detect the MIME type of `data`, falling back to the client's declared
/// type and then to `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use courier_s3_core::sniff::detect_content_type;
///
/// assert_eq!(detect_content_type(b"%PDF-1.7 ...", None), "application/pdf");
/// assert_eq!(detect_content_type(b"\x00\x01\x02", Some("video/mp2t")), "video/mp2t");
/// ```
#[must_use]
pub fn detect_content_type(data: &[u8], declared: Option<&str>) -> String {
    sniff(data)
        .map(ToOwned::to_owned)
        .or_else(|| declared.and_then(|d| d.parse::<Mime>().ok()).map(|m| m.to_string()))
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

fn sniff(data: &[u8]) -> Option<&'static str> {
    if data.is_empty() {
        return None;
    }
    if let Some((_, found)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Some(*found);
    }
    if let Some(found) = sniff_riff_or_iso(data) {
        return Some(found);
    }
    sniff_text(data)
}

fn sniff_riff_or_iso(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        return match &data[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return match &data[8..12] {
            b"qt  " => Some("video/quicktime"),
            b"M4A " => Some("audio/mp4"),
            b"heic" | b"heix" => Some("image/heic"),
            _ => Some("video/mp4"),
        };
    }
    None
}

fn sniff_text(data: &[u8]) -> Option<&'static str> {
    let sample = &data[..data.len().min(TEXT_SAMPLE)];
    // A multi-byte character may be cut at the sample boundary.
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&sample[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };
    if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return None;
    }

    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml") {
        return Some("text/xml");
    }
    if trimmed.starts_with("<svg") {
        return Some("image/svg+xml");
    }
    let lower = trimmed.get(..trimmed.len().min(15)).unwrap_or("").to_ascii_lowercase();
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return Some("text/html");
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_slice::<serde::de::IgnoredAny>(data).is_ok()
    {
        return Some("application/json");
    }
    Some("text/plain")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_detect_binary_signatures() {
        assert_eq!(detect_content_type(b"\x89PNG\r\n\x1a\n....", None), "image/png");
        assert_eq!(detect_content_type(b"\xff\xd8\xff\xe0", None), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a...", None), "image/gif");
        assert_eq!(detect_content_type(b"PK\x03\x04rest", None), "application/zip");
        assert_eq!(detect_content_type(b"\x1f\x8b\x08", None), "application/gzip");
    }

    #[test]
    fn test_should_detect_container_formats() {
        assert_eq!(detect_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 ", None), "image/webp");
        assert_eq!(detect_content_type(b"RIFF\x00\x00\x00\x00WAVEfmt ", None), "audio/wav");
        assert_eq!(detect_content_type(b"\x00\x00\x00\x18ftypisom", None), "video/mp4");
    }

    #[test]
    fn test_should_detect_text_formats() {
        assert_eq!(detect_content_type(b"hello world\n", None), "text/plain");
        assert_eq!(detect_content_type(br#"{"a": [1, 2]}"#, None), "application/json");
        assert_eq!(detect_content_type(b"<?xml version=\"1.0\"?><a/>", None), "text/xml");
        assert_eq!(detect_content_type(b"<!DOCTYPE html><html>", None), "text/html");
    }

    #[test]
    fn test_should_treat_invalid_json_as_text() {
        assert_eq!(detect_content_type(b"{not json", None), "text/plain");
    }

    #[test]
    fn test_should_fall_back_to_declared_then_octet_stream() {
        assert_eq!(
            detect_content_type(b"\x00\x01\x02\x03", Some("application/x-custom")),
            "application/x-custom"
        );
        assert_eq!(
            detect_content_type(b"\x00\x01\x02\x03", Some("not a mime")),
            "application/octet-stream"
        );
        assert_eq!(detect_content_type(b"", None), "application/octet-stream");
    }
}
