//! Error types for camera aggregation and view management.
//!
//! All errors implement `std::error::Error` and carry enough context to decide
//! how to surface them to the user.
//!
//! ## Error Categories
//!
//! - **Backend Errors**: authentication, transport or payload failures from a
//!   single camera engine. These are scoped to one camera and never abort a
//!   multi-camera query.
//! - **Media Errors**: a specific media item can no longer be played.
//! - **Misuse Errors**: duplicate or unknown camera identifiers, invalid views
//!   and invalid configuration. These fail the attempted operation and leave
//!   state untouched.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use camdeck::DeckError;
//!
//! let error = DeckError::transport_failed("front_door", "connection reset");
//! assert!(error.is_backend());
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type alias for camdeck operations.
pub type Result<T, E = DeckError> = std::result::Result<T, E>;

/// Main error type for camdeck operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeckError {
    #[error("Authentication failed for camera '{camera_id}': {reason}")]
    Auth { camera_id: String, reason: String },

    #[error("Backend transport failed for camera '{camera_id}': {reason}")]
    Transport {
        camera_id: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Malformed backend payload for camera '{camera_id}' in {context}: {details}")]
    MalformedPayload { camera_id: String, context: String, details: String },

    #[error("Media '{media}' on camera '{camera_id}' can no longer be resolved")]
    UnresolvableMedia { camera_id: String, media: String },

    #[error("Camera '{camera_id}' is already registered")]
    DuplicateCamera { camera_id: String },

    #[error("Camera '{camera_id}' is not registered")]
    UnknownCamera { camera_id: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid view: {reason}")]
    InvalidView { reason: String },

    #[error("{operation} is not supported by the {engine} engine")]
    Unsupported { operation: String, engine: String },

    #[error("Query was superseded before it completed")]
    Cancelled,
}

impl DeckError {
    /// Whether this error originated from a camera backend.
    ///
    /// Malformed payloads propagate the same way as transport and auth
    /// failures: scoped to the camera that produced them.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            DeckError::Auth { .. } | DeckError::Transport { .. } | DeckError::MalformedPayload { .. }
        )
    }

    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeckError::Transport { .. } => true,
            DeckError::Cancelled => true,
            DeckError::Auth { .. } => false,
            DeckError::MalformedPayload { .. } => false,
            DeckError::UnresolvableMedia { .. } => false,
            DeckError::DuplicateCamera { .. } => false,
            DeckError::UnknownCamera { .. } => false,
            DeckError::InvalidConfig { .. } => false,
            DeckError::InvalidView { .. } => false,
            DeckError::Unsupported { .. } => false,
        }
    }

    /// Camera this error is scoped to, if any.
    pub fn camera_id(&self) -> Option<&str> {
        match self {
            DeckError::Auth { camera_id, .. }
            | DeckError::Transport { camera_id, .. }
            | DeckError::MalformedPayload { camera_id, .. }
            | DeckError::UnresolvableMedia { camera_id, .. }
            | DeckError::DuplicateCamera { camera_id }
            | DeckError::UnknownCamera { camera_id } => Some(camera_id),
            _ => None,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DeckError::Auth { .. } => vec![
                "Check the backend credentials for this camera",
                "Verify the host integration is still logged in",
            ],
            DeckError::Transport { .. } => vec![
                "Check network connectivity to the backend",
                "Verify the backend service is running",
                "Retry the query",
            ],
            DeckError::MalformedPayload { .. } => vec![
                "Check the backend version is supported",
                "Verify the backend is not behind a proxy rewriting responses",
            ],
            DeckError::UnresolvableMedia { .. } => vec![
                "Refresh the query, the media may have expired",
                "Check backend retention settings",
            ],
            DeckError::DuplicateCamera { .. } => vec![
                "Give each camera a unique id in the configuration",
                "Remove the duplicated camera entry",
            ],
            DeckError::UnknownCamera { .. } => vec![
                "Check the camera id spelling",
                "Verify the camera is present in the configuration",
            ],
            DeckError::InvalidConfig { .. } => vec![
                "Check the configuration against the documented fields",
                "Ensure at least one camera is configured",
            ],
            DeckError::InvalidView { .. } => vec![
                "Only media views may carry a query",
                "Ensure the query kind matches the view mode",
            ],
            DeckError::Unsupported { .. } => vec![
                "Check the camera capabilities before offering the action",
            ],
            DeckError::Cancelled => vec!["Re-issue the query if it is still wanted"],
        }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(camera_id: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::Transport { camera_id: camera_id.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        camera_id: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DeckError::Transport {
            camera_id: camera_id.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for authentication errors.
    pub fn auth_failed(camera_id: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::Auth { camera_id: camera_id.into(), reason: reason.into() }
    }

    /// Helper constructor for payload parse errors.
    pub fn malformed_payload(
        camera_id: impl Into<String>,
        context: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        DeckError::MalformedPayload {
            camera_id: camera_id.into(),
            context: context.into(),
            details: details.into(),
        }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        DeckError::InvalidConfig { reason: reason.into() }
    }

    /// Helper constructor for view invariant violations.
    pub fn invalid_view(reason: impl Into<String>) -> Self {
        DeckError::InvalidView { reason: reason.into() }
    }

    /// Helper constructor for unknown cameras.
    pub fn unknown_camera(camera_id: impl Into<String>) -> Self {
        DeckError::UnknownCamera { camera_id: camera_id.into() }
    }

    /// Helper constructor for unsupported engine operations.
    pub fn unsupported(operation: impl Into<String>, engine: impl Into<String>) -> Self {
        DeckError::Unsupported { operation: operation.into(), engine: engine.into() }
    }
}

impl From<serde_yaml_ng::Error> for DeckError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        DeckError::InvalidConfig { reason: err.to_string() }
    }
}
