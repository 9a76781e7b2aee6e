use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{
    api::traits::ImageService,
    error::{GalleryError, Operation, Result},
    models::{DeleteResponse, GenerationRequest, GenerationResponse, ImageListResponse, ImageSummary},
};
use async_trait::async_trait;
use chrono::Utc;

/// 1x1 transparent PNG.
const PLACEHOLDER_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[derive(Default)]
struct State {
    images: Vec<ImageSummary>,
    counter: u64,
    failures: HashMap<Operation, (u16, String)>,
    calls: HashMap<Operation, usize>,
}

/// In-process image service.
///
/// Keeps images newest first, serves the placeholder PNG as every payload,
/// and can be told to fail the next call of a given operation.
#[derive(Default)]
pub struct InMemoryImageService {
    state: Mutex<State>,
}

impl InMemoryImageService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The next call of `operation` answers `status` with `message` as detail.
    pub fn fail_next(&self, operation: Operation, status: u16, message: impl Into<String>) {
        self.lock().failures.insert(operation, (status, message.into()));
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.lock().images.iter().map(|image| image.filename.clone()).collect()
    }

    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        if let Some((status, message)) = state.failures.remove(&operation) {
            return Err(GalleryError::Service {
                operation,
                status,
                message,
            });
        }
        Ok(state)
    }

    fn payload(summary: &ImageSummary, include_inline_data: bool) -> ImageSummary {
        let mut summary = summary.clone();
        summary.image_data = if include_inline_data {
            Some(format!("data:image/png;base64,{}", PLACEHOLDER_PNG))
        } else {
            None
        };
        summary
    }
}

fn out_of_range(operation: Operation, field: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(GalleryError::Service {
            operation,
            status: 422,
            message: format!("{} must be between {} and {}", field, min, max),
        });
    }
    Ok(())
}

#[async_trait]
impl ImageService for InMemoryImageService {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let mut state = self.enter(Operation::Generate)?;

        let width = request.width.unwrap_or(512);
        let height = request.height.unwrap_or(512);
        out_of_range(Operation::Generate, "width", width, 256, 1024)?;
        out_of_range(Operation::Generate, "height", height, 256, 1024)?;
        out_of_range(
            Operation::Generate,
            "num_inference_steps",
            request.steps.unwrap_or(4),
            1,
            50,
        )?;

        state.counter += 1;
        let now = Utc::now().naive_utc();
        let filename = format!("flux_{}_{}.png", now.format("%Y%m%d_%H%M%S"), state.counter);

        let summary = ImageSummary {
            filename: filename.clone(),
            width,
            height,
            format: "PNG".to_string(),
            size_bytes: PLACEHOLDER_PNG.len() as u64 * 3 / 4,
            created_at: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            image_data: None,
        };
        state.images.insert(0, summary.clone());

        Ok(GenerationResponse {
            success: true,
            filepath: format!("images/{}", filename),
            filename,
            message: "Image generated successfully".to_string(),
            image_info: Self::payload(&summary, true),
        })
    }

    async fn list_images(&self, include_inline_data: bool) -> Result<ImageListResponse> {
        let state = self.enter(Operation::List)?;
        let images: Vec<ImageSummary> = state
            .images
            .iter()
            .map(|image| Self::payload(image, include_inline_data))
            .collect();

        Ok(ImageListResponse {
            success: true,
            count: images.len(),
            images,
        })
    }

    async fn delete_image(&self, filename: &str) -> Result<DeleteResponse> {
        let mut state = self.enter(Operation::Delete)?;
        let before = state.images.len();
        state.images.retain(|image| image.filename != filename);

        if state.images.len() == before {
            return Err(GalleryError::Service {
                operation: Operation::Delete,
                status: 404,
                message: format!("Image not found: {}", filename),
            });
        }

        Ok(DeleteResponse {
            success: true,
            message: format!("Successfully deleted: {}", filename),
        })
    }

    async fn get_image_info(&self, filename: &str, include_inline_data: bool) -> Result<ImageSummary> {
        let state = self.enter(Operation::Info)?;
        state
            .images
            .iter()
            .find(|image| image.filename == filename)
            .map(|image| Self::payload(image, include_inline_data))
            .ok_or_else(|| GalleryError::Service {
                operation: Operation::Info,
                status: 404,
                message: format!("Image not found: {}", filename),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_then_list_newest_first() {
        let service = InMemoryImageService::new();
        let first = service.generate(GenerationRequest::new("one")).await.unwrap();
        let second = service.generate(GenerationRequest::new("two")).await.unwrap();

        let list = service.list_images(false).await.unwrap();
        assert_eq!(list.count, 2);
        assert_eq!(list.images[0].filename, second.filename);
        assert_eq!(list.images[1].filename, first.filename);
        assert!(list.images.iter().all(|image| image.image_data.is_none()));
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_size() {
        let service = InMemoryImageService::new();
        let err = service
            .generate(GenerationRequest::new("x").with_size(2048, 512))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert!(service.filenames().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let service = InMemoryImageService::new();
        service.fail_next(Operation::List, 503, "busy");
        assert_eq!(service.list_images(true).await.unwrap_err().user_message(), "busy");
        assert!(service.list_images(true).await.is_ok());
        assert_eq!(service.calls(Operation::List), 2);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let service = InMemoryImageService::new();
        let generated = service.generate(GenerationRequest::new("x")).await.unwrap();
        assert!(service.delete_image(&generated.filename).await.is_ok());
        assert!(service.delete_image(&generated.filename).await.unwrap_err().is_not_found());
    }
}
