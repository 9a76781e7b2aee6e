use crate::{
    error::Result,
    models::{DeleteResponse, GenerationRequest, GenerationResponse, ImageListResponse, ImageSummary},
};
use async_trait::async_trait;

/// Raw request/response contract of the image service.
///
/// Any non-success answer is an `Err`; implementations never retry or cache.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    async fn list_images(&self, include_inline_data: bool) -> Result<ImageListResponse>;

    async fn delete_image(&self, filename: &str) -> Result<DeleteResponse>;

    async fn get_image_info(&self, filename: &str, include_inline_data: bool)
        -> Result<ImageSummary>;

    /// Direct URL of the stored file, for backends that serve one.
    fn image_url(&self, _filename: &str) -> Option<String> {
        None
    }
}
