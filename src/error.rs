use std::fmt;

/// The four calls the client makes against the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    List,
    Delete,
    Info,
}

impl Operation {
    /// Message shown when the service gives no `detail` of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Generate => "Failed to generate image",
            Operation::List => "Failed to list images",
            Operation::Delete => "Failed to delete image",
            Operation::Info => "Failed to get image info",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Generate => "generate",
            Operation::List => "list",
            Operation::Delete => "delete",
            Operation::Info => "info",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service error during {operation} (HTTP {status}): {message}")]
    Service {
        operation: Operation,
        status: u16,
        message: String,
    },

    #[error("Transport error during {operation}: {reason}")]
    Transport { operation: Operation, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GalleryError {
    pub fn validation(message: impl Into<String>) -> Self {
        GalleryError::Validation(message.into())
    }

    /// Text suitable for an inline error or a page banner.
    ///
    /// Transport failures are not distinguished from service failures
    /// without a message: both surface the per-operation fallback.
    pub fn user_message(&self) -> String {
        match self {
            GalleryError::Validation(msg) => msg.clone(),
            GalleryError::Service { message, .. } => message.clone(),
            GalleryError::Transport { operation, .. } => operation.fallback_message().to_string(),
            GalleryError::Decode(msg) => msg.clone(),
            GalleryError::Config(msg) => msg.clone(),
            GalleryError::Io(err) => err.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GalleryError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_uses_fallback() {
        let err = GalleryError::Transport {
            operation: Operation::Delete,
            reason: "connection refused".into(),
        };
        assert_eq!(err.user_message(), "Failed to delete image");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_service_error_message_and_status() {
        let err = GalleryError::Service {
            operation: Operation::Info,
            status: 404,
            message: "Image not found: a.png".into(),
        };
        assert_eq!(err.user_message(), "Image not found: a.png");
        assert!(err.is_not_found());
        assert_eq!(GalleryError::validation("x").status(), None);
    }
}
