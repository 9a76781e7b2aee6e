pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod ui;

pub use api::{ApiClient, HttpImageService, ImageService, InMemoryImageService};
pub use config::{Config, GeneratorLimits, ServiceConfig, SliderRange};
pub use error::{GalleryError, Operation, Result};
pub use models::*;
pub use ui::{DetailViewer, Gallery, GeneratorPanel, PageController, Session};
