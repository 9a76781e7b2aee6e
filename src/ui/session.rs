use crate::{
    api::ApiClient,
    config::GeneratorLimits,
    error::Result,
    models::{DeleteResponse, ImageSummary},
    ui::{
        gallery::{DeleteOutcome, Gallery, PendingDelete},
        generator::{GenerationOutcome, GeneratorPanel, PendingGeneration},
        page::{LoadOutcome, PageController, PendingLoad},
        viewer::Download,
    },
};

/// Page, panel and gallery wired to one API client.
///
/// The `async` methods run one request to completion. The `finish_*`
/// methods apply a result obtained elsewhere, so several requests can be
/// in flight and land in any order.
pub struct Session {
    api: ApiClient,
    page: PageController,
    generator: GeneratorPanel,
    gallery: Gallery,
}

impl Session {
    pub fn new(api: ApiClient, limits: GeneratorLimits) -> Self {
        Self {
            api,
            page: PageController::new(),
            generator: GeneratorPanel::new(limits),
            gallery: Gallery::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn page(&self) -> &PageController {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut PageController {
        &mut self.page
    }

    pub fn generator(&self) -> &GeneratorPanel {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut GeneratorPanel {
        &mut self.generator
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut Gallery {
        &mut self.gallery
    }

    pub fn images(&self) -> &[ImageSummary] {
        self.page.images()
    }

    pub async fn load(&mut self) -> LoadOutcome {
        let pending = self.page.begin_load();
        let result = self.api.list_images(pending.include_inline_data).await;
        self.finish_load(pending, result)
    }

    pub fn finish_load(&mut self, pending: PendingLoad, result: Result<Vec<ImageSummary>>) -> LoadOutcome {
        self.page.complete_load(pending.ticket, result)
    }

    /// Fails only on local validation; service errors come back as
    /// [`GenerationOutcome::Failed`].
    pub async fn submit(&mut self) -> Result<GenerationOutcome> {
        let pending = self.generator.submit()?;
        let result = self.api.generate(pending.request.clone()).await;
        Ok(self.finish_generation(pending, result))
    }

    pub fn finish_generation(
        &mut self,
        pending: PendingGeneration,
        result: Result<ImageSummary>,
    ) -> GenerationOutcome {
        let outcome = self.generator.complete(pending.ticket, result);
        if let GenerationOutcome::Generated(image) = &outcome {
            self.page.on_generated(image.clone());
        }
        outcome
    }

    /// `None` when the dialog was declined or a delete is already running.
    pub async fn delete<F>(&mut self, filename: &str, confirm: F) -> Option<DeleteOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        let pending = self.gallery.delete_with(filename, confirm)?;
        let result = self.api.delete_image(&pending.filename).await;
        Some(self.finish_delete(&pending, result))
    }

    pub fn finish_delete(&mut self, pending: &PendingDelete, result: Result<DeleteResponse>) -> DeleteOutcome {
        let outcome = self.gallery.complete_delete(pending, result);
        if let DeleteOutcome::Removed(filename) = &outcome {
            self.page.on_deleted(filename);
        }
        outcome
    }

    /// Opens the viewer on a listed image.
    pub fn open(&mut self, filename: &str) -> bool {
        match self.page.find(filename) {
            Some(image) => {
                self.gallery.open(image);
                true
            }
            None => false,
        }
    }

    pub fn download_viewed(&self) -> Result<Option<Download>> {
        self.gallery.viewer().download()
    }
}
