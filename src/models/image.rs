use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::GeneratorLimits;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomize_seed: Option<bool>,
    #[serde(rename = "num_inference_steps", skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
}

impl GenerationRequest {
    /// Prompt only; the service applies its own defaults for the rest.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: None,
            height: None,
            seed: None,
            randomize_seed: None,
            steps: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn with_seed(mut self, seed: i64, randomize: bool) -> Self {
        self.seed = Some(seed);
        self.randomize_seed = Some(randomize);
        self
    }

    /// Fills every unset parameter from `limits` and clamps the set ones.
    pub fn normalized(mut self, limits: &GeneratorLimits) -> Self {
        self.width = Some(limits.width.snap(self.width.unwrap_or(limits.default_width)));
        self.height = Some(limits.height.snap(self.height.unwrap_or(limits.default_height)));
        self.steps = Some(limits.steps.snap(self.steps.unwrap_or(limits.default_steps)));
        self.seed = Some(self.seed.unwrap_or(limits.default_seed));
        self.randomize_seed = Some(self.randomize_seed.unwrap_or(limits.default_randomize_seed));
        self
    }

    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

/// Metadata for one stored image, optionally with its inline payload.
///
/// `filename` is the identity key. Summaries are replaced wholesale, never
/// patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub size_bytes: u64,
    pub created_at: String,
    #[serde(rename = "base64", default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl ImageSummary {
    pub fn has_inline_data(&self) -> bool {
        self.image_data.as_deref().map_or(false, |data| !data.is_empty())
    }

    /// Same summary without the payload.
    pub fn without_inline_data(mut self) -> Self {
        self.image_data = None;
        self
    }

    /// Parses `created_at`; accepts RFC 3339 and the naive ISO-8601 form the
    /// service writes.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_local());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub filename: String,
    pub filepath: String,
    pub message: String,
    pub image_info: ImageSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub success: bool,
    pub count: usize,
    pub images: Vec<ImageSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_names() {
        let request = GenerationRequest::new("a red fox in snow")
            .with_size(512, 512)
            .with_steps(4)
            .with_seed(7, true);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "prompt": "a red fox in snow",
                "width": 512,
                "height": 512,
                "seed": 7,
                "randomize_seed": true,
                "num_inference_steps": 4
            })
        );

        let bare = serde_json::to_value(GenerationRequest::new("x")).unwrap();
        assert_eq!(bare, json!({ "prompt": "x" }));
    }

    #[test]
    fn test_normalized_fills_and_clamps() {
        let limits = GeneratorLimits::default();
        let request = GenerationRequest::new("p").with_size(2000, 300).normalized(&limits);
        assert_eq!(request.width, Some(1024));
        assert_eq!(request.height, Some(320));
        assert_eq!(request.steps, Some(4));
        assert_eq!(request.seed, Some(0));
        assert_eq!(request.randomize_seed, Some(true));
    }

    #[test]
    fn test_summary_parses_service_shape() {
        let summary: ImageSummary = serde_json::from_value(json!({
            "filename": "flux_20240501_123045.png",
            "width": 512,
            "height": 768,
            "format": "PNG",
            "size_bytes": 401234,
            "created_at": "2024-05-01T12:30:45.123456",
            "base64": null
        }))
        .unwrap();
        assert!(!summary.has_inline_data());
        let created = summary.created_at().unwrap();
        assert_eq!(created.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 12:30");

        let rfc = ImageSummary {
            created_at: "2024-05-01T12:30:45Z".into(),
            ..summary
        };
        assert!(rfc.created_at().is_some());
    }
}
