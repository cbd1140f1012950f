//! Test utilities: media generators, a scripted camera engine and a fake NVR
//! transport.
//!
//! Compiled for unit tests and for benchmarks (`--features benchmark`).

#![cfg(any(test, feature = "benchmark"))]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::camera::Camera;
use crate::config::{CameraConfig, EngineKind};
use crate::engine::{CameraEngine, MediaCapabilities, ResolvedMedia};
use crate::engines::nvr::{NvrRequest, NvrTransport, TransportError};
use crate::types::{Capabilities, Capability, EventQuery, MediaKind, RecordingQuery, ViewMedia};
use crate::{DeckError, Result};

/// UTC timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// A finished clip with an id, starting at `secs`.
pub fn clip_at(camera_id: &str, id: &str, secs: i64) -> ViewMedia {
    ViewMedia::new(MediaKind::Clip, camera_id, format!("events/{id}/clip.mp4"))
        .with_id(id)
        .with_start_time(at(secs))
        .with_end_time(Some(at(secs + 5)))
        .with_title(format!("Clip {id}"))
}

/// `count` clips per camera with distinct ids and interleaved start times.
pub fn generate_media(camera_ids: &[&str], count: usize) -> Vec<ViewMedia> {
    let mut media = Vec::with_capacity(camera_ids.len() * count);
    for i in 0..count {
        for (c, camera_id) in camera_ids.iter().enumerate() {
            let secs = (i * camera_ids.len() + c) as i64 * 10;
            media.push(clip_at(camera_id, &format!("{camera_id}-{i}"), secs));
        }
    }
    media
}

/// Minimal generic camera configuration with an explicit id.
pub fn generic_config(id: &str) -> CameraConfig {
    CameraConfig { id: Some(id.to_string()), engine: EngineKind::Generic, ..Default::default() }
}

/// Camera bound to `engine` with fixed capabilities.
pub fn camera_with(id: &str, engine: Arc<dyn CameraEngine>, capabilities: Capabilities) -> Camera {
    Camera::new(id, generic_config(id), engine, capabilities)
}

type ErrorFactory = Arc<dyn Fn() -> DeckError + Send + Sync>;

/// Camera engine answering from scripted per-camera data.
///
/// Each camera can be given events, recordings, an artificial delay and a
/// failure. Delays use `tokio::time::sleep`, so tests running on a paused clock
/// control completion order exactly.
#[derive(Default)]
pub struct ScriptedEngine {
    capabilities: Option<Capabilities>,
    camera_capabilities: HashMap<String, Capabilities>,
    events: HashMap<String, Vec<ViewMedia>>,
    recordings: HashMap<String, Vec<ViewMedia>>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, ErrorFactory>,
    probe_failures: HashMap<String, ErrorFactory>,
    fetches: Mutex<HashMap<String, usize>>,
    probes: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities reported for every camera without its own entry.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_camera_capabilities(mut self, camera_id: &str, capabilities: Capabilities) -> Self {
        self.camera_capabilities.insert(camera_id.to_string(), capabilities);
        self
    }

    pub fn with_events(mut self, camera_id: &str, events: Vec<ViewMedia>) -> Self {
        self.events.insert(camera_id.to_string(), events);
        self
    }

    pub fn with_recordings(mut self, camera_id: &str, recordings: Vec<ViewMedia>) -> Self {
        self.recordings.insert(camera_id.to_string(), recordings);
        self
    }

    pub fn with_delay(mut self, camera_id: &str, delay: Duration) -> Self {
        self.delays.insert(camera_id.to_string(), delay);
        self
    }

    /// Fail every fetch for `camera_id` with the error built by `error`.
    pub fn with_failure<F>(mut self, camera_id: &str, error: F) -> Self
    where
        F: Fn() -> DeckError + Send + Sync + 'static,
    {
        self.failures.insert(camera_id.to_string(), Arc::new(error));
        self
    }

    /// Fail the capability probe for `camera_id`.
    pub fn with_probe_failure<F>(mut self, camera_id: &str, error: F) -> Self
    where
        F: Fn() -> DeckError + Send + Sync + 'static,
    {
        self.probe_failures.insert(camera_id.to_string(), Arc::new(error));
        self
    }

    /// Number of fetches issued for `camera_id`.
    pub fn fetch_count(&self, camera_id: &str) -> usize {
        self.fetches.lock().map(|fetches| fetches.get(camera_id).copied().unwrap_or(0)).unwrap_or(0)
    }

    /// Number of capability probes across all cameras.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    async fn answer(&self, camera: &Camera, scripted: &HashMap<String, Vec<ViewMedia>>) -> Result<Vec<ViewMedia>> {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(camera.id().to_string()).or_default() += 1;
        }
        if let Some(delay) = self.delays.get(camera.id()) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.failures.get(camera.id()) {
            return Err(error());
        }
        Ok(scripted.get(camera.id()).cloned().unwrap_or_default())
    }
}

impl std::fmt::Debug for ScriptedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedEngine")
            .field("cameras", &self.events.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl CameraEngine for ScriptedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Generic
    }

    async fn capabilities(&self, config: &CameraConfig) -> Result<Capabilities> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let id = config.derive_id()?;
        if let Some(error) = self.probe_failures.get(&id) {
            return Err(error());
        }
        let capabilities = self
            .camera_capabilities
            .get(&id)
            .copied()
            .or(self.capabilities)
            .unwrap_or_else(|| [Capability::Live].into_iter().collect());
        Ok(config.capabilities.apply(capabilities))
    }

    async fn fetch_events(&self, camera: &Camera, _query: &EventQuery) -> Result<Vec<ViewMedia>> {
        self.answer(camera, &self.events).await
    }

    async fn fetch_recordings(&self, camera: &Camera, _query: &RecordingQuery) -> Result<Vec<ViewMedia>> {
        self.answer(camera, &self.recordings).await
    }

    async fn resolve_media(&self, _camera: &Camera, media: &ViewMedia) -> Result<ResolvedMedia> {
        Ok(ResolvedMedia { url: media.content_id().to_string(), mime_type: None })
    }

    async fn set_favorite(&self, _camera: &Camera, _media: &ViewMedia, _favorite: bool) -> Result<()> {
        Ok(())
    }

    fn media_capabilities(&self, _camera: &Camera, media: &ViewMedia) -> MediaCapabilities {
        MediaCapabilities {
            can_favorite: media.kind() != MediaKind::Recording,
            can_download: media.id().is_some(),
        }
    }
}

type Responder = Box<dyn Fn(&NvrRequest) -> std::result::Result<String, TransportError> + Send + Sync>;

/// NVR transport answering through a closure and recording every request.
pub struct FakeNvrTransport {
    responder: Responder,
    requests: Mutex<Vec<NvrRequest>>,
}

impl FakeNvrTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&NvrRequest) -> std::result::Result<String, TransportError> + Send + Sync + 'static,
    {
        Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()) }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<NvrRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NvrTransport for FakeNvrTransport {
    async fn request(&self, request: &NvrRequest) -> std::result::Result<String, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        (self.responder)(request)
    }
}
