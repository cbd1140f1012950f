//! Transport seam between the NVR engine and the host integration

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

/// A request the NVR engine needs answered by the backend.
///
/// The host integration owns the actual connection (websocket, HTTP proxy)
/// and returns the backend's JSON response body unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NvrRequest {
    /// Events for one camera, newest first, strictly before `before` when set.
    Events {
        camera: String,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
        labels: BTreeSet<String>,
        zones: BTreeSet<String>,
        has_clip: Option<bool>,
        has_snapshot: Option<bool>,
        favorites: Option<bool>,
        limit: usize,
    },
    /// Hourly recording segment summary for one camera.
    Recordings { camera: String, after: Option<DateTime<Utc>>, before: Option<DateTime<Utc>> },
    /// Per-camera backend configuration, used for capability probing.
    CameraConfig { camera: String },
    /// Sign or otherwise resolve a media path into a playable URL.
    ResolveMedia { camera: String, path: String },
    /// Set or clear the retain flag of an event.
    SetRetain { camera: String, event_id: String, retain: bool },
}

impl NvrRequest {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            NvrRequest::Events { .. } => "events",
            NvrRequest::Recordings { .. } => "recordings",
            NvrRequest::CameraConfig { .. } => "camera_config",
            NvrRequest::ResolveMedia { .. } => "resolve_media",
            NvrRequest::SetRetain { .. } => "set_retain",
        }
    }
}

/// Failure reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network failure: {0}")]
    Network(String),
}

/// Carries [`NvrRequest`]s to the backend.
#[async_trait::async_trait]
pub trait NvrTransport: Send + Sync + 'static {
    /// Execute `request`, returning the raw JSON response body.
    async fn request(&self, request: &NvrRequest) -> Result<String, TransportError>;
}
