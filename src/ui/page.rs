//! Session image list and its reconciliation rules.
//!
//! Completions are applied in arrival order. List results carry the
//! sequence number they were issued at:
//!
//! * a list older than the last applied list is dropped;
//! * deletes that completed after a list was issued are filtered out of it;
//! * generations that completed after a list was issued stay at its head.
//!
//! A deleted image therefore never comes back from a slow refresh, and a
//! new image never vanishes because of one.

use std::collections::BTreeSet;

use crate::{
    error::Result,
    models::ImageSummary,
    ui::epoch::{Sequencer, Ticket},
};

pub const LOAD_FALLBACK_MESSAGE: &str = "Failed to load images";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLoad {
    pub ticket: Ticket,
    pub include_inline_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { count: usize },
    /// A newer list was applied first.
    Stale,
    /// Shown as the page banner.
    Failed(String),
    Discarded,
}

#[derive(Debug, Clone, Default)]
pub struct PageController {
    images: Vec<ImageSummary>,
    tickets: Sequencer,
    pending_loads: BTreeSet<u64>,
    last_applied_list: u64,
    // Mutations applied while loads are pending, replayed onto late lists.
    deleted_since: Vec<(u64, String)>,
    generated_since: Vec<(u64, ImageSummary)>,
    banner: Option<String>,
}

impl PageController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[ImageSummary] {
        &self.images
    }

    pub fn find(&self, filename: &str) -> Option<&ImageSummary> {
        self.images.iter().find(|image| image.filename == filename)
    }

    pub fn is_loading(&self) -> bool {
        !self.pending_loads.is_empty()
    }

    /// Placeholder cards while the first list is still on its way.
    pub fn show_skeleton(&self) -> bool {
        self.is_loading() && self.images.is_empty()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn count_label(&self) -> String {
        match self.images.len() {
            1 => "1 image created".to_string(),
            n => format!("{} images created", n),
        }
    }

    /// Initial load, with inline data so the viewer can download.
    pub fn mount(&mut self) -> PendingLoad {
        self.begin_load()
    }

    /// Banner retry; same request as the initial load.
    pub fn retry(&mut self) -> PendingLoad {
        self.begin_load()
    }

    pub fn begin_load(&mut self) -> PendingLoad {
        let ticket = self.tickets.issue();
        self.pending_loads.insert(ticket.seq());
        self.banner = None;
        PendingLoad {
            ticket,
            include_inline_data: true,
        }
    }

    pub fn complete_load(&mut self, ticket: Ticket, result: Result<Vec<ImageSummary>>) -> LoadOutcome {
        if !self.tickets.is_current(&ticket) {
            return LoadOutcome::Discarded;
        }
        self.pending_loads.remove(&ticket.seq());

        if ticket.seq() < self.last_applied_list {
            log::debug!(
                "Dropping list issued at seq {} (applied seq {})",
                ticket.seq(),
                self.last_applied_list
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(list) => {
                self.apply_list(ticket.seq(), list);
                LoadOutcome::Applied {
                    count: self.images.len(),
                }
            }
            Err(err) => {
                let message = err.user_message();
                let message = if message.is_empty() {
                    LOAD_FALLBACK_MESSAGE.to_string()
                } else {
                    message
                };
                log::error!("Failed to load images: {}", message);
                self.banner = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    fn apply_list(&mut self, issued: u64, list: Vec<ImageSummary>) {
        let mut images: Vec<ImageSummary> = list
            .into_iter()
            .filter(|image| {
                !self
                    .deleted_since
                    .iter()
                    .any(|(seq, filename)| *seq > issued && *filename == image.filename)
            })
            .collect();

        // Oldest first so the newest generation ends up at the head.
        for (_, image) in self.generated_since.iter().filter(|(seq, _)| *seq > issued) {
            images.retain(|existing| existing.filename != image.filename);
            images.insert(0, image.clone());
        }

        let replayed = self.deleted_since.len() + self.generated_since.len();
        self.deleted_since.retain(|(seq, _)| *seq > issued);
        self.generated_since.retain(|(seq, _)| *seq > issued);

        log::info!(
            "Loaded {} images (seq {}, {} pending mutations checked)",
            images.len(),
            issued,
            replayed
        );

        self.images = images;
        self.last_applied_list = issued;
        self.banner = None;
    }

    /// Prepends a fresh generation; an entry with the same filename is replaced.
    pub fn on_generated(&mut self, image: ImageSummary) {
        let seq = self.tickets.issue().seq();
        self.images.retain(|existing| existing.filename != image.filename);
        self.images.insert(0, image.clone());
        if self.is_loading() {
            self.generated_since.push((seq, image));
        }
    }

    /// Removes by filename. Returns false if it was not in the list.
    pub fn on_deleted(&mut self, filename: &str) -> bool {
        let seq = self.tickets.issue().seq();
        let before = self.images.len();
        self.images.retain(|image| image.filename != filename);
        self.generated_since.retain(|(_, image)| image.filename != filename);
        if self.is_loading() {
            self.deleted_since.push((seq, filename.to_string()));
        }
        self.images.len() != before
    }

    pub fn unmount(&mut self) {
        self.tickets.advance_epoch();
        self.pending_loads.clear();
        self.deleted_since.clear();
        self.generated_since.clear();
    }
}
