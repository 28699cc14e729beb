//! Image sources: data URLs for uploads and embedded export images.
//!
//! Uploaded bytes become a base64 `data:` URL with a MIME type sniffed from
//! the content. Export only embeds `data:` URLs that decode; anything else
//! renders as the placeholder.

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF.
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from content.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Self {
        match image::guess_format(data) {
            Ok(image::ImageFormat::Png) => Self::Png,
            Ok(image::ImageFormat::Jpeg) => Self::Jpeg,
            Ok(image::ImageFormat::Gif) => Self::Gif,
            Ok(image::ImageFormat::WebP) => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// The format's MIME type.
    #[must_use]
    pub const fn mime(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::Gif => Some("image/gif"),
            Self::WebP => Some("image/webp"),
            Self::Unknown => None,
        }
    }
}

/// A decoded image's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detected format.
    pub format: ImageFormat,
}

/// Encode uploaded bytes as a `data:` URL.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the bytes are not a recognised image.
pub fn encode_data_url(bytes: &[u8]) -> RenderResult<String> {
    let format = ImageFormat::sniff(bytes);
    let mime = format
        .mime()
        .ok_or_else(|| RenderError::Resource("Unrecognised image format".to_string()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Whether a source is a `data:` URL.
#[must_use]
pub fn is_data_url(src: &str) -> bool {
    src.starts_with("data:")
}

/// Decode the payload of a `data:` URL.
///
/// Supports base64 (`data:image/png;base64,...`) and percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the URL is malformed.
pub fn decode_data_url(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mime = metadata
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_string();

    let bytes = if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    Ok((mime, bytes))
}

/// Decode a `data:` URL image far enough to learn its size and format.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the image cannot be decoded.
pub fn load_image_from_data_url(uri: &str) -> RenderResult<DecodedImage> {
    let (mime, bytes) = decode_data_url(uri)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let format = match ImageFormat::sniff(&bytes) {
        ImageFormat::Unknown => ImageFormat::from_mime(&mime),
        known => known,
    };
    Ok(DecodedImage {
        width: img.width(),
        height: img.height(),
        format,
    })
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red pixel.
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn png_bytes() -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(PNG_BASE64)
            .expect("fixture decodes")
    }

    #[test]
    fn test_upload_becomes_data_url() {
        let url = encode_data_url(&png_bytes()).expect("encode");
        assert_eq!(url, format!("data:image/png;base64,{PNG_BASE64}"));
    }

    #[test]
    fn test_upload_rejects_non_images() {
        assert!(encode_data_url(b"plain text, not an image").is_err());
    }

    #[test]
    fn test_data_url_loading() {
        let decoded = load_image_from_data_url(&format!("data:image/png;base64,{PNG_BASE64}"))
            .expect("decode");
        assert_eq!(decoded.width, 1);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[test]
    fn test_invalid_data_urls() {
        assert!(load_image_from_data_url("https://picsum.photos/400/300").is_err());
        assert!(load_image_from_data_url("data:image/png").is_err());
        assert!(load_image_from_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        let (mime, bytes) = decode_data_url("data:text/plain,a%20b").expect("decode");
        assert_eq!(mime, "text/plain");
        assert_eq!(bytes, b"a b");
        assert!(decode_data_url("data:,bad%2").is_err());
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(ImageFormat::from_mime("image/JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::Unknown.mime(), None);
    }
}
