use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    error::{GalleryError, Result},
    models::{format_dimensions, ImageSummary, InlineImage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Full-size modal for one image. Never talks to the network.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailViewer {
    #[default]
    Closed,
    Open(Box<ImageSummary>),
}

/// Bytes ready to be written under `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Writes into `dir`, keeping only the final component of the filename.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .ok_or_else(|| GalleryError::validation(format!("Invalid filename: {}", self.filename)))?;
        let path = dir.join(name);
        fs::write(&path, &self.bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

impl DetailViewer {
    pub fn open(&mut self, image: ImageSummary) {
        if !image.has_inline_data() {
            log::debug!("Opening viewer for {} without inline data", image.filename);
        }
        *self = DetailViewer::Open(Box::new(image));
    }

    pub fn close(&mut self) {
        *self = DetailViewer::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DetailViewer::Open(_))
    }

    pub fn image(&self) -> Option<&ImageSummary> {
        match self {
            DetailViewer::Open(image) => Some(image.as_ref()),
            DetailViewer::Closed => None,
        }
    }

    pub fn shows(&self, filename: &str) -> bool {
        self.image().map_or(false, |image| image.filename == filename)
    }

    /// Background scrolling is suppressed while the modal is mounted.
    pub fn scroll_locked(&self) -> bool {
        self.is_open()
    }

    /// Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if key == Key::Escape && self.is_open() {
            self.close();
            return true;
        }
        false
    }

    /// `None` when closed or when the summary was fetched without its payload.
    pub fn download(&self) -> Result<Option<Download>> {
        let image = match self.image() {
            Some(image) => image,
            None => return Ok(None),
        };
        let data = match image.image_data.as_deref() {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(None),
        };

        let inline = InlineImage::from_data_uri(data)?;
        Ok(Some(Download {
            filename: image.filename.clone(),
            mime_type: inline.mime_type,
            bytes: inline.bytes,
        }))
    }

    /// Metadata rows shown under the image.
    pub fn details(&self) -> Vec<(&'static str, String)> {
        match self.image() {
            Some(image) => vec![
                ("Filename", image.filename.clone()),
                ("Dimensions", format_dimensions(image.width, image.height)),
                ("Format", image.format.clone()),
                ("Size", format!("{:.1} KB", image.size_bytes as f64 / 1024.0)),
            ],
            None => Vec::new(),
        }
    }
}
