use crate::error::{GalleryError, Result};
use reqwest::Url;
use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: None,
            user_agent: None,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `FLUX_API_URL` wins over `NEXT_PUBLIC_API_URL`; both are optional.
    pub fn from_env() -> Self {
        ServiceConfig {
            base_url: resolve_base_url(
                env::var("FLUX_API_URL").ok(),
                env::var("NEXT_PUBLIC_API_URL").ok(),
            ),
            user_agent: env::var("FLUX_USER_AGENT").ok(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn base_url_or_default(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Parsed origin. Only http and https are accepted.
    pub fn origin(&self) -> Result<Url> {
        let raw = self.base_url_or_default().trim();
        let url = Url::parse(raw)
            .map_err(|e| GalleryError::Config(format!("Invalid base URL '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(GalleryError::Config(format!(
                "Unsupported URL scheme '{}' in '{}'",
                other, raw
            ))),
        }
    }
}

/// First non-blank value, trimmed.
fn resolve_base_url(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}

/// Inclusive integer range with a fixed step, as exposed by a slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl SliderRange {
    /// Bounds given in the wrong order are swapped.
    pub const fn new(min: u32, max: u32, step: u32) -> Self {
        if min > max {
            Self { min: max, max: min, step }
        } else {
            Self { min, max, step }
        }
    }

    /// `(low, high)` even when the public fields were set out of order.
    fn bounds(&self) -> (u32, u32) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    /// Snap to the nearest step counted from `min`, then clamp.
    pub fn snap(&self, value: u32) -> u32 {
        let (low, high) = self.bounds();
        let clamped = value.clamp(low, high);
        if self.step <= 1 {
            return clamped;
        }
        let offset = clamped - low;
        let down = offset - offset % self.step;
        let up = down + self.step;
        let snapped = if offset - down >= up - offset {
            low.saturating_add(up)
        } else {
            low + down
        };
        if snapped > high {
            low + down
        } else {
            snapped
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        let (low, high) = self.bounds();
        value >= low && value <= high && (value - low) % self.step.max(1) == 0
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorLimits {
    pub width: SliderRange,
    pub height: SliderRange,
    pub steps: SliderRange,
    pub default_width: u32,
    pub default_height: u32,
    pub default_steps: u32,
    pub default_seed: i64,
    pub default_randomize_seed: bool,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        GeneratorLimits {
            width: SliderRange::new(256, 1024, 64),
            height: SliderRange::new(256, 1024, 64),
            steps: SliderRange::new(1, 20, 1),
            default_width: 512,
            default_height: 512,
            default_steps: 4,
            default_seed: 0,
            default_randomize_seed: true,
        }
    }
}

impl GeneratorLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.steps.max = max.max(self.steps.min);
        self.default_steps = self.steps.snap(self.default_steps);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub limits: GeneratorLimits,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: ServiceConfig::default(),
            limits: GeneratorLimits::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let mut limits = GeneratorLimits::default();
        if let Some(max) = env::var("FLUX_MAX_STEPS").ok().and_then(|s| s.parse().ok()) {
            limits = limits.with_max_steps(max);
        }

        Config {
            service: ServiceConfig::from_env(),
            limits,
        }
    }

    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.service = service;
        self
    }

    pub fn with_limits(mut self, limits: GeneratorLimits) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin() {
        let config = ServiceConfig::new();
        assert_eq!(config.origin().unwrap().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_base_url_resolution() {
        let url = |s: &str| Some(s.to_string());

        assert_eq!(
            resolve_base_url(url("http://flux:9000"), url("http://next:3000")),
            url("http://flux:9000")
        );
        assert_eq!(resolve_base_url(None, url(" http://next:3000 ")), url("http://next:3000"));
        assert_eq!(resolve_base_url(url("   "), url("http://next:3000")), url("http://next:3000"));
        assert_eq!(resolve_base_url(url(""), url("")), None);

        let config = ServiceConfig {
            base_url: resolve_base_url(None, None),
            user_agent: None,
        };
        assert_eq!(config.base_url_or_default(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let config = ServiceConfig::new().with_base_url("ftp://example.com");
        assert!(matches!(config.origin(), Err(GalleryError::Config(_))));

        let config = ServiceConfig::new().with_base_url("not a url");
        assert!(config.origin().is_err());
    }

    #[test]
    fn test_slider_snaps_and_clamps() {
        let range = SliderRange::new(256, 1024, 64);
        assert_eq!(range.snap(512), 512);
        assert_eq!(range.snap(540), 512);
        assert_eq!(range.snap(560), 576);
        assert_eq!(range.snap(10), 256);
        assert_eq!(range.snap(5000), 1024);
        assert!(range.contains(768));
        assert!(!range.contains(770));

        let steps = SliderRange::new(1, 20, 1);
        assert_eq!(steps.snap(0), 1);
        assert_eq!(steps.snap(25), 20);
    }

    #[test]
    fn test_reversed_bounds_do_not_panic() {
        let range = SliderRange::new(1024, 256, 64);
        assert_eq!(range, SliderRange::new(256, 1024, 64));
        assert_eq!(range.snap(5000), 1024);

        let raw = SliderRange {
            min: 1024,
            max: 256,
            step: 64,
        };
        assert_eq!(raw.snap(540), 512);
        assert_eq!(raw.snap(10), 256);
        assert!(raw.contains(768));
    }

    #[test]
    fn test_limits_defaults() {
        let limits = GeneratorLimits::default();
        assert_eq!(limits.default_width, 512);
        assert_eq!(limits.default_steps, 4);
        assert!(limits.default_randomize_seed);

        let limits = limits.with_max_steps(2);
        assert_eq!(limits.steps.max, 2);
        assert_eq!(limits.default_steps, 2);
    }
}
