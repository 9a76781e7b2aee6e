pub mod http;
pub mod memory;
pub mod traits;

use crate::{
    config::ServiceConfig,
    error::Result,
    models::{DeleteResponse, GenerationRequest, ImageSummary},
};
use std::sync::Arc;

pub use http::HttpImageService;
pub use memory::InMemoryImageService;
pub use traits::ImageService;

/// Typed entry point over an [`ImageService`] backend.
#[derive(Clone)]
pub struct ApiClient {
    service: Arc<dyn ImageService>,
}

impl ApiClient {
    pub fn new(service: Arc<dyn ImageService>) -> Self {
        Self { service }
    }

    pub fn http(config: &ServiceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpImageService::new(config)?)))
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<ImageSummary> {
        let response = self.service.generate(request).await?;
        log::info!("{} ({})", response.message, response.filename);
        Ok(response.image_info)
    }

    /// Summaries in service order. Without `include_inline_data` no entry
    /// carries a payload, whatever the service sent.
    pub async fn list_images(&self, include_inline_data: bool) -> Result<Vec<ImageSummary>> {
        let response = self.service.list_images(include_inline_data).await?;
        if response.count != response.images.len() {
            log::warn!(
                "Image list count mismatch: count={} images={}",
                response.count,
                response.images.len()
            );
        }

        let images = if include_inline_data {
            response.images
        } else {
            response
                .images
                .into_iter()
                .map(ImageSummary::without_inline_data)
                .collect()
        };
        Ok(images)
    }

    pub async fn delete_image(&self, filename: &str) -> Result<DeleteResponse> {
        self.service.delete_image(filename).await
    }

    pub async fn get_image_info(&self, filename: &str, include_inline_data: bool) -> Result<ImageSummary> {
        let summary = self.service.get_image_info(filename, include_inline_data).await?;
        Ok(if include_inline_data {
            summary
        } else {
            summary.without_inline_data()
        })
    }

    pub fn image_url(&self, filename: &str) -> Option<String> {
        self.service.image_url(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_without_data_strips_payload() {
        let server = MockServer::start().await;
        // A service that ignores the flag still yields payload-free summaries.
        Mock::given(method("GET"))
            .and(path("/api/images"))
            .and(query_param("include_base64", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "count": 1,
                "images": [{
                    "filename": "a.png", "width": 256, "height": 256, "format": "PNG",
                    "size_bytes": 10, "created_at": "2024-05-01T00:00:00",
                    "base64": "data:image/png;base64,AAAA"
                }]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::http(&ServiceConfig::new().with_base_url(server.uri())).unwrap();
        let images = client.list_images(false).await.unwrap();
        assert_eq!(images.len(), 1);
        assert!(images.iter().all(|image| image.image_data.is_none()));
    }

    #[tokio::test]
    async fn test_list_with_data_keeps_payload() {
        let service = Arc::new(InMemoryImageService::new());
        let client = ApiClient::new(service.clone());
        client.generate(GenerationRequest::new("x")).await.unwrap();

        let images = client.list_images(true).await.unwrap();
        assert!(images.iter().all(ImageSummary::has_inline_data));

        let info = client.get_image_info(&images[0].filename, false).await.unwrap();
        assert!(info.image_data.is_none());
        assert_eq!(client.image_url("a.png"), None);
    }
}
