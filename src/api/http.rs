use crate::{
    api::traits::ImageService,
    config::ServiceConfig,
    error::{GalleryError, Operation, Result},
    logger::Timer,
    models::{DeleteResponse, GenerationRequest, GenerationResponse, ImageListResponse, ImageSummary},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Image service reached over HTTP.
#[derive(Clone)]
pub struct HttpImageService {
    client: Client,
    origin: Url,
}

impl HttpImageService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let origin = config.origin()?;

        let mut builder = Client::builder();
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| GalleryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        log::debug!("Image service origin: {}", origin);

        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Appends path segments to the origin, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|_| GalleryError::Config(format!("Base URL cannot hold a path: {}", self.origin)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_inline_flag(mut url: Url, include_inline_data: bool) -> Url {
        url.query_pairs_mut()
            .append_pair("include_base64", if include_inline_data { "true" } else { "false" });
        url
    }

    async fn send<T: DeserializeOwned>(&self, operation: Operation, request: RequestBuilder) -> Result<T> {
        let request_id = Uuid::new_v4().to_string();
        let timer = Timer::new(&format!("{} [req:{}]", operation, request_id));

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Image service {} request failed: {}", operation, e);
                GalleryError::Transport {
                    operation,
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GalleryError::Transport {
            operation,
            reason: format!("Failed to read response body: {}", e),
        })?;
        drop(timer);

        if !status.is_success() {
            let message = error_detail(&body).unwrap_or_else(|| operation.fallback_message().to_string());
            log::warn!("Image service {} returned {}: {}", operation, status, message);
            return Err(GalleryError::Service {
                operation,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            GalleryError::Decode(format!("Unexpected {} response from image service: {}", operation, e))
        })
    }
}

/// Message carried in a FastAPI-style error body.
///
/// `detail` is either a string or a list of validation objects with `msg`.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let url = self.endpoint(&["api", "generate"])?;
        log::info!("Generating image for prompt ({} chars)", request.prompt.chars().count());
        self.send(Operation::Generate, self.client.post(url).json(&request))
            .await
    }

    async fn list_images(&self, include_inline_data: bool) -> Result<ImageListResponse> {
        let url = Self::with_inline_flag(self.endpoint(&["api", "images"])?, include_inline_data);
        self.send(Operation::List, self.client.get(url)).await
    }

    async fn delete_image(&self, filename: &str) -> Result<DeleteResponse> {
        let url = self.endpoint(&["api", "images", filename])?;
        log::info!("Deleting image: {}", filename);
        self.send(Operation::Delete, self.client.delete(url)).await
    }

    async fn get_image_info(&self, filename: &str, include_inline_data: bool) -> Result<ImageSummary> {
        let url = Self::with_inline_flag(
            self.endpoint(&["api", "images", filename, "info"])?,
            include_inline_data,
        );
        self.send(Operation::Info, self.client.get(url)).await
    }

    fn image_url(&self, filename: &str) -> Option<String> {
        self.endpoint(&["api", "images", filename])
            .ok()
            .map(|url| url.to_string())
    }
}
