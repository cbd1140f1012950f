//! Camera manager: builds cameras from configuration and fans queries out to
//! their engines.
//!
//! Queries targeting several cameras are dispatched concurrently and joined
//! all-settled: every camera either contributes its media or a
//! [`CameraFailure`], and one failing backend never hides the results of the
//! others. Merging goes through [`MediaQueriesResults`], so the final order is
//! the same whatever order the backends answer in.

use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::camera::{Camera, CameraEvent, CameraEventCallback};
use crate::config::{CameraConfig, DeckConfig};
use crate::engine::{MediaCapabilities, ResolvedMedia};
use crate::engines::EngineFactory;
use crate::store::CameraStore;
use crate::types::{Capabilities, Capability, MediaKind, MediaQuery, ViewMedia};
use crate::view::MediaQueriesResults;
use crate::{DeckError, Result};

/// A single camera's failure during a multi-camera operation.
#[derive(Debug)]
pub struct CameraFailure {
    pub camera_id: String,
    pub error: DeckError,
}

/// Merged results of a query plus the cameras that failed to contribute.
#[derive(Debug)]
pub struct QueryOutcome {
    pub query: MediaQuery,
    pub results: MediaQueriesResults,
    pub failures: Vec<CameraFailure>,
}

impl QueryOutcome {
    /// Whether every targeted camera answered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_camera_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.camera_id.as_str())
    }
}

/// Outcome of [`CameraManager::initialize`].
#[derive(Debug, Default)]
pub struct InitReport {
    /// Cameras added, in configuration order.
    pub added: Vec<String>,
    /// Cameras added with fallback capabilities because their probe failed.
    pub degraded: Vec<CameraFailure>,
    /// Camera entries that could not be added at all.
    pub rejected: Vec<CameraFailure>,
}

/// Owns the camera store and dispatches work to camera engines.
pub struct CameraManager {
    store: CameraStore,
    engines: EngineFactory,
    event_callback: Option<CameraEventCallback>,
}

impl fmt::Debug for CameraManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraManager")
            .field("store", &self.store)
            .field("engines", &self.engines)
            .field("has_event_callback", &self.event_callback.is_some())
            .finish()
    }
}

impl CameraManager {
    pub fn new(engines: EngineFactory) -> Self {
        Self { store: CameraStore::new(), engines, event_callback: None }
    }

    /// Callback handed to every camera added afterwards.
    pub fn with_event_callback(mut self, callback: CameraEventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Read-only access to the registered cameras.
    pub fn store(&self) -> &CameraStore {
        &self.store
    }

    /// Add every configured camera in order.
    ///
    /// Individual camera failures are collected in the report rather than
    /// aborting the rest. Fails only when no cameras are configured.
    pub async fn initialize(&mut self, config: &DeckConfig) -> Result<InitReport> {
        if config.cameras.is_empty() {
            return Err(DeckError::invalid_config("no cameras configured"));
        }

        let mut report = InitReport::default();
        for (index, camera_config) in config.cameras.iter().enumerate() {
            match self.add_camera_with_probe(camera_config.clone()).await {
                Ok((camera, probe_error)) => {
                    report.added.push(camera.id().to_string());
                    if let Some(error) = probe_error {
                        report.degraded.push(CameraFailure { camera_id: camera.id().to_string(), error });
                    }
                }
                Err(error) => {
                    let camera_id = camera_config
                        .derive_id()
                        .unwrap_or_else(|_| format!("#{index}"));
                    warn!(camera = %camera_id, %error, "Camera rejected");
                    report.rejected.push(CameraFailure { camera_id, error });
                }
            }
        }

        info!(
            added = report.added.len(),
            degraded = report.degraded.len(),
            rejected = report.rejected.len(),
            "Camera initialization complete"
        );
        Ok(report)
    }

    /// Build a camera from `config` and register it.
    ///
    /// The id is checked before the engine is probed, so a duplicate never
    /// touches the backend. A backend failure while probing capabilities
    /// leaves the camera registered with live-only capabilities.
    pub async fn add_camera(&mut self, config: CameraConfig) -> Result<Arc<Camera>> {
        self.add_camera_with_probe(config).await.map(|(camera, _)| camera)
    }

    async fn add_camera_with_probe(
        &mut self,
        config: CameraConfig,
    ) -> Result<(Arc<Camera>, Option<DeckError>)> {
        let id = config.derive_id()?;
        if self.store.has_camera(&id) {
            return Err(DeckError::DuplicateCamera { camera_id: id });
        }
        let engine = self.engines.engine(config.engine)?;

        let (capabilities, probe_error) = match engine.capabilities(&config).await {
            Ok(capabilities) => (capabilities, None),
            Err(error) if error.is_backend() => {
                warn!(camera = %id, %error, "Capability probe failed, falling back to live only");
                (config.capabilities.apply([Capability::Live].into_iter().collect()), Some(error))
            }
            Err(error) => return Err(error),
        };

        let mut camera = Camera::new(id, config, engine, capabilities);
        if let Some(callback) = &self.event_callback {
            camera = camera.with_event_callback(Arc::clone(callback));
        }
        let camera = self.store.add_camera(camera)?;
        debug!(camera = %camera.id(), engine = ?camera.engine().kind(), ?capabilities, "Camera added");
        Ok((camera, probe_error))
    }

    /// Intersection of capabilities across `camera_ids`, or across every
    /// camera when `None`.
    pub fn aggregate_capabilities<'a, I>(&self, camera_ids: Option<I>) -> Capabilities
    where
        I: IntoIterator<Item = &'a str>,
    {
        match camera_ids {
            Some(ids) => self.store.aggregate_capabilities(ids),
            None => self.store.all_capabilities(),
        }
    }

    /// Run `query` against every target camera concurrently and merge.
    ///
    /// Never fails as a whole: unknown targets and backend errors are reported
    /// per camera in [`QueryOutcome::failures`]. Cameras lacking the capability
    /// the query needs contribute nothing and are not failures.
    pub async fn execute_query(&self, query: &MediaQuery) -> QueryOutcome {
        let mut failures = Vec::new();
        let mut targets = Vec::new();
        // BTreeSet iteration keeps the dispatch and concatenation order stable.
        for camera_id in query.cameras() {
            match self.store.get_camera(camera_id) {
                Some(camera) if supports_query(camera, query) => targets.push(Arc::clone(camera)),
                Some(_) => debug!(camera = %camera_id, "Camera cannot serve query, skipping"),
                None => failures.push(CameraFailure {
                    camera_id: camera_id.clone(),
                    error: DeckError::unknown_camera(camera_id),
                }),
            }
        }

        debug!(targets = targets.len(), events = query.is_events(), "Dispatching query");
        let settled = join_all(targets.iter().map(|camera| fetch(camera, query))).await;

        let mut media = Vec::new();
        for (camera, result) in targets.iter().zip(settled) {
            match result {
                Ok(items) => {
                    debug!(camera = %camera.id(), count = items.len(), "Camera answered");
                    media.extend(items.into_iter().map(|item| item.with_camera_id(camera.id())));
                }
                Err(error) => {
                    warn!(camera = %camera.id(), %error, retryable = error.is_retryable(), "Camera query failed");
                    failures.push(CameraFailure { camera_id: camera.id().to_string(), error });
                }
            }
        }

        QueryOutcome {
            query: query.clone(),
            results: MediaQueriesResults::from_media(media),
            failures,
        }
    }

    /// [`execute_query`](Self::execute_query) that gives up with
    /// [`DeckError::Cancelled`] as soon as `cancel` fires.
    pub async fn execute_query_cancellable(
        &self,
        query: &MediaQuery,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome> {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Query cancelled before completion");
                Err(DeckError::Cancelled)
            }
            outcome = self.execute_query(query) => Ok(outcome),
        }
    }

    /// Resolve `media` into a playable locator through its camera's engine.
    pub async fn resolve_media(&self, media: &ViewMedia) -> Result<ResolvedMedia> {
        let camera = self.camera_for(media)?;
        camera.engine().resolve_media(camera, media).await
    }

    /// What may be done with `media`. Unknown cameras allow nothing.
    pub fn media_capabilities(&self, media: &ViewMedia) -> MediaCapabilities {
        self.store
            .get_camera(media.camera_id())
            .map(|camera| camera.engine().media_capabilities(camera, media))
            .unwrap_or_default()
    }

    /// Mark or unmark `media` as favorite on its backend.
    pub async fn set_favorite(&self, media: &ViewMedia, favorite: bool) -> Result<()> {
        let camera = self.camera_for(media)?;
        camera.engine().set_favorite(camera, media, favorite).await?;
        info!(camera = %camera.id(), media = ?media.id(), favorite, "Favorite updated");
        Ok(())
    }

    /// Route a backend event to its camera's callback.
    pub fn dispatch_event(&self, event: &CameraEvent) -> Result<()> {
        let camera = self
            .store
            .get_camera(event.camera_id())
            .ok_or_else(|| DeckError::unknown_camera(event.camera_id()))?;
        camera.notify(event);
        Ok(())
    }

    fn camera_for(&self, media: &ViewMedia) -> Result<&Arc<Camera>> {
        self.store
            .get_camera(media.camera_id())
            .ok_or_else(|| DeckError::unknown_camera(media.camera_id()))
    }
}

fn supports_query(camera: &Camera, query: &MediaQuery) -> bool {
    match query {
        MediaQuery::Events(events) => match events.media_kind() {
            MediaKind::Snapshot => camera.has_capability(Capability::Snapshots),
            _ => camera.has_capability(Capability::Clips),
        },
        MediaQuery::Recordings(_) => camera.has_capability(Capability::Recordings),
    }
}

async fn fetch(camera: &Camera, query: &MediaQuery) -> Result<Vec<ViewMedia>> {
    match query {
        MediaQuery::Events(events) => camera.engine().fetch_events(camera, events).await,
        MediaQuery::Recordings(recordings) => camera.engine().fetch_recordings(camera, recordings).await,
    }
}
