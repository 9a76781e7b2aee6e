use std::collections::HashMap;

use crate::{
    error::Result,
    models::{format_dimensions, format_file_size, format_timestamp, DeleteResponse, ImageSummary},
    ui::{
        epoch::{Sequencer, Ticket},
        viewer::DetailViewer,
    },
};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this image?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub ticket: Ticket,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Remove this filename from the page list.
    Removed(String),
    Failed { filename: String, message: String },
    Discarded,
}

/// One rendered gallery tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub filename: String,
    pub dimensions: String,
    pub size: String,
    pub created: String,
    pub has_preview: bool,
    pub deleting: bool,
}

/// Grid over the page's list. Owns no images, only per-item transient state.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    deleting: HashMap<String, Ticket>,
    confirming: Option<String>,
    notice: Option<String>,
    viewer: DetailViewer,
    tickets: Sequencer,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_deleting(&self, filename: &str) -> bool {
        self.deleting.contains_key(filename)
    }

    pub fn confirming(&self) -> Option<&str> {
        self.confirming.as_deref()
    }

    /// Last delete failure, shown as an alert.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn viewer(&self) -> &DetailViewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut DetailViewer {
        &mut self.viewer
    }

    /// Click on a card outside its delete control.
    pub fn open(&mut self, image: &ImageSummary) {
        self.viewer.open(image.clone());
    }

    pub fn close_viewer(&mut self) {
        self.viewer.close();
    }

    /// Asks for confirmation. Ignored while that filename is already deleting.
    pub fn request_delete(&mut self, filename: &str) -> bool {
        if self.is_deleting(filename) {
            return false;
        }
        self.confirming = Some(filename.to_string());
        true
    }

    pub fn cancel_delete(&mut self) {
        self.confirming = None;
    }

    /// Marks the confirmed filename deleting and hands back the call to make.
    pub fn confirm_delete(&mut self) -> Option<PendingDelete> {
        let filename = self.confirming.take()?;
        if self.is_deleting(&filename) {
            return None;
        }

        let ticket = self.tickets.issue();
        self.deleting.insert(filename.clone(), ticket);
        log::debug!("Delete confirmed for {} (seq {})", filename, ticket.seq());
        Some(PendingDelete { ticket, filename })
    }

    /// Request plus confirmation in one step, with `confirm` answering the
    /// dialog.
    pub fn delete_with<F>(&mut self, filename: &str, confirm: F) -> Option<PendingDelete>
    where
        F: FnOnce(&str) -> bool,
    {
        if !self.request_delete(filename) {
            return None;
        }
        if confirm(DELETE_CONFIRMATION) {
            self.confirm_delete()
        } else {
            self.cancel_delete();
            None
        }
    }

    /// Clears the deleting flag whatever the result.
    pub fn complete_delete(&mut self, pending: &PendingDelete, result: Result<DeleteResponse>) -> DeleteOutcome {
        if !self.tickets.is_current(&pending.ticket)
            || self.deleting.get(&pending.filename) != Some(&pending.ticket)
        {
            log::debug!("Discarding stale delete result for {}", pending.filename);
            return DeleteOutcome::Discarded;
        }
        self.deleting.remove(&pending.filename);

        match result {
            Ok(response) => {
                log::info!("{}", response.message);
                if self.viewer.shows(&pending.filename) {
                    self.viewer.close();
                }
                DeleteOutcome::Removed(pending.filename.clone())
            }
            Err(err) => {
                let message = err.user_message();
                log::warn!("Delete of {} failed: {}", pending.filename, message);
                self.notice = Some(message.clone());
                DeleteOutcome::Failed {
                    filename: pending.filename.clone(),
                    message,
                }
            }
        }
    }

    pub fn cards(&self, images: &[ImageSummary]) -> Vec<CardView> {
        images
            .iter()
            .map(|image| CardView {
                filename: image.filename.clone(),
                dimensions: format_dimensions(image.width, image.height),
                size: format_file_size(image.size_bytes),
                created: image
                    .created_at()
                    .map(|ts| format_timestamp(&ts))
                    .unwrap_or_else(|| image.created_at.clone()),
                has_preview: image.has_inline_data(),
                deleting: self.is_deleting(&image.filename),
            })
            .collect()
    }

    pub fn unmount(&mut self) {
        self.tickets.advance_epoch();
        self.deleting.clear();
        self.confirming = None;
        self.viewer.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GalleryError, Operation};

    fn image(filename: &str) -> ImageSummary {
        ImageSummary {
            filename: filename.to_string(),
            width: 512,
            height: 512,
            format: "PNG".to_string(),
            size_bytes: 1536,
            created_at: "2024-05-01T12:30:45.000001".to_string(),
            image_data: None,
        }
    }

    fn ok(filename: &str) -> Result<DeleteResponse> {
        Ok(DeleteResponse {
            success: true,
            message: format!("Successfully deleted: {}", filename),
        })
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut gallery = Gallery::new();
        assert_eq!(gallery.delete_with("a.png", |_| false), None);
        assert!(!gallery.is_deleting("a.png"));
        assert_eq!(gallery.confirming(), None);

        let pending = gallery
            .delete_with("a.png", |question| {
                assert_eq!(question, DELETE_CONFIRMATION);
                true
            })
            .unwrap();
        assert!(gallery.is_deleting("a.png"));
        assert_eq!(
            gallery.complete_delete(&pending, ok("a.png")),
            DeleteOutcome::Removed("a.png".into())
        );
        assert!(!gallery.is_deleting("a.png"));
    }

    #[test]
    fn test_one_delete_per_filename() {
        let mut gallery = Gallery::new();
        let _pending = gallery.delete_with("a.png", |_| true).unwrap();
        assert!(!gallery.request_delete("a.png"));
        assert_eq!(gallery.delete_with("a.png", |_| true), None);
        assert!(gallery.delete_with("b.png", |_| true).is_some());
    }

    #[test]
    fn test_failed_delete_keeps_item_and_clears_flag() {
        let mut gallery = Gallery::new();
        let pending = gallery.delete_with("a.png", |_| true).unwrap();
        let err = GalleryError::Transport {
            operation: Operation::Delete,
            reason: "reset".into(),
        };
        let outcome = gallery.complete_delete(&pending, Err(err));
        assert_eq!(
            outcome,
            DeleteOutcome::Failed {
                filename: "a.png".into(),
                message: "Failed to delete image".into()
            }
        );
        assert!(!gallery.is_deleting("a.png"));
        assert_eq!(gallery.notice(), Some("Failed to delete image"));
    }

    #[test]
    fn test_deleting_viewed_image_closes_viewer() {
        let mut gallery = Gallery::new();
        gallery.open(&image("a.png"));
        assert!(gallery.viewer().shows("a.png"));

        let pending = gallery.delete_with("a.png", |_| true).unwrap();
        gallery.complete_delete(&pending, ok("a.png"));
        assert!(!gallery.viewer().is_open());
    }

    #[test]
    fn test_cards_reflect_state() {
        let mut gallery = Gallery::new();
        let images = vec![image("a.png"), image("b.png")];
        let _pending = gallery.delete_with("b.png", |_| true).unwrap();

        let cards = gallery.cards(&images);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].dimensions, "512 × 512");
        assert_eq!(cards[0].size, "1.5 KB");
        assert_eq!(cards[0].created, "May 1, 12:30 PM");
        assert!(!cards[0].has_preview);
        assert!(!cards[0].deleting);
        assert!(cards[1].deleting);
    }

    #[test]
    fn test_result_after_unmount_is_discarded() {
        let mut gallery = Gallery::new();
        let pending = gallery.delete_with("a.png", |_| true).unwrap();
        gallery.unmount();
        assert_eq!(gallery.complete_delete(&pending, ok("a.png")), DeleteOutcome::Discarded);
    }
}
