//! Engine for plain live cameras with no event history

use tracing::debug;

use crate::camera::Camera;
use crate::config::{CameraConfig, EngineKind};
use crate::engine::{CameraEngine, ResolvedMedia};
use crate::types::{Capabilities, Capability, EventQuery, RecordingQuery, ViewMedia};
use crate::Result;

/// Engine for cameras that only offer a live stream.
///
/// Queries always succeed with no results and content locators resolve to
/// themselves.
#[derive(Debug, Default)]
pub struct GenericEngine;

impl GenericEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CameraEngine for GenericEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Generic
    }

    async fn capabilities(&self, config: &CameraConfig) -> Result<Capabilities> {
        let capabilities = config.capabilities.apply([Capability::Live].into_iter().collect());
        debug!(camera = ?config.id, ?capabilities, "Generic camera capabilities");
        Ok(capabilities)
    }

    async fn fetch_events(&self, _camera: &Camera, _query: &EventQuery) -> Result<Vec<ViewMedia>> {
        Ok(Vec::new())
    }

    async fn fetch_recordings(
        &self,
        _camera: &Camera,
        _query: &RecordingQuery,
    ) -> Result<Vec<ViewMedia>> {
        Ok(Vec::new())
    }

    async fn resolve_media(&self, _camera: &Camera, media: &ViewMedia) -> Result<ResolvedMedia> {
        Ok(ResolvedMedia { url: media.content_id().to_string(), mime_type: None })
    }
}
