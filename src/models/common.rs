use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDateTime;

use crate::error::{GalleryError, Result};

/// Decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| GalleryError::Decode("Inline image is not a data URI".into()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| GalleryError::Decode("Data URI has no payload".into()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| GalleryError::Decode("Data URI is not base64 encoded".into()))?;

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| GalleryError::Decode(format!("Invalid base64 payload: {}", e)))?;

        Ok(Self {
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type.to_string()
            },
            bytes,
        })
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

pub fn format_dimensions(width: u32, height: u32) -> String {
    format!("{} × {}", width, height)
}

/// Short card timestamp, e.g. `May 1, 12:30 PM`.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%b %-d, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_decodes() {
        let image = InlineImage::from_data_uri("data:image/png;base64,iVBORw0K").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(&image.bytes[..4], b"\x89PNG");
        assert!(image.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_data_uri_rejects_garbage() {
        assert!(InlineImage::from_data_uri("iVBORw0K").is_err());
        assert!(InlineImage::from_data_uri("data:image/png;base64").is_err());
        assert!(InlineImage::from_data_uri("data:image/png,abc").is_err());
        assert!(InlineImage::from_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_dimensions(512, 768), "512 × 768");

        let ts = NaiveDateTime::parse_from_str("2024-05-01T12:30:45", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(format_timestamp(&ts), "May 1, 12:30 PM");
    }
}
