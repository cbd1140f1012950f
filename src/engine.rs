//! Engine trait for camera backends

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::config::{CameraConfig, EngineKind};
use crate::types::{Capabilities, EventQuery, RecordingQuery, ViewMedia};
use crate::{DeckError, Result};

/// Playable or streamable locator for a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub url: String,
    pub mime_type: Option<String>,
}

/// What the user may do with one media item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilities {
    pub can_favorite: bool,
    pub can_download: bool,
}

/// Trait for camera backends
///
/// Engines translate backend-native data into [`ViewMedia`] and execute
/// queries against one backend. One engine instance may serve many cameras;
/// the camera is passed to every call.
///
/// Contract shared by every implementation:
/// - An empty `Vec` is a valid result, never an error
/// - Auth, transport and payload failures are reported as distinct
///   [`DeckError`] variants so callers can tell what is retryable
/// - Pagination, rate limiting and timeouts are the engine's own business
#[async_trait::async_trait]
pub trait CameraEngine: Send + Sync + 'static {
    /// Backend kind this engine serves.
    fn kind(&self) -> EngineKind;

    /// Capabilities for a camera, from configuration plus any live probe.
    async fn capabilities(&self, config: &CameraConfig) -> Result<Capabilities>;

    /// Fetch events (clips and snapshots) matching `query` for one camera.
    async fn fetch_events(&self, camera: &Camera, query: &EventQuery) -> Result<Vec<ViewMedia>>;

    /// Fetch recording segments matching `query` for one camera.
    async fn fetch_recordings(
        &self,
        camera: &Camera,
        query: &RecordingQuery,
    ) -> Result<Vec<ViewMedia>>;

    /// Resolve a media item into a playable locator.
    ///
    /// Returns [`DeckError::UnresolvableMedia`] if the backend no longer has it.
    async fn resolve_media(&self, camera: &Camera, media: &ViewMedia) -> Result<ResolvedMedia>;

    /// Mark or unmark a media item as favorite.
    async fn set_favorite(&self, _camera: &Camera, _media: &ViewMedia, _favorite: bool) -> Result<()> {
        Err(DeckError::unsupported("favorite", self.kind().as_str()))
    }

    /// Per-item capabilities.
    fn media_capabilities(&self, _camera: &Camera, _media: &ViewMedia) -> MediaCapabilities {
        MediaCapabilities::default()
    }
}
