//! Engine for NVR-backed cameras.
//!
//! The engine never talks to the network itself. Every backend interaction
//! goes through an [`NvrTransport`] supplied by the host integration, and the
//! engine is responsible for:
//!
//! - building [`NvrRequest`]s from queries and camera configuration
//! - paginating event listings with a `before` cursor until the query limit
//! - parsing JSON payloads and normalizing them into [`ViewMedia`]
//! - mapping transport failures into distinct [`DeckError`] variants

mod transport;
mod types;

pub use transport::{NvrRequest, NvrTransport, TransportError};
pub use types::{
    NvrCameraProbe, NvrEvent, NvrEventMessage, NvrEventMessageKind, NvrRecordingSegment,
    NvrResolvedPath, from_epoch_seconds,
};

use chrono::TimeDelta;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::camera::{Camera, CameraEvent};
use crate::config::{CameraConfig, EngineKind};
use crate::engine::{CameraEngine, MediaCapabilities, ResolvedMedia};
use crate::types::{
    Capabilities, Capability, EventQuery, MediaKind, RecordingQuery, ViewMedia,
};
use crate::{DeckError, Result};

/// Default number of events fetched when a query sets no limit.
pub const DEFAULT_EVENT_LIMIT: usize = 50;

/// Default backend page size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Engine for cameras recorded by an NVR.
pub struct NvrEngine {
    transport: Arc<dyn NvrTransport>,
    page_size: usize,
}

impl NvrEngine {
    pub fn new(transport: Arc<dyn NvrTransport>) -> Self {
        Self { transport, page_size: DEFAULT_PAGE_SIZE }
    }

    /// Override the backend page size (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Parse a push notification into a [`CameraEvent`] for `camera_id`.
    pub fn parse_event_message(camera_id: &str, payload: &str) -> Result<CameraEvent> {
        let message: NvrEventMessage = parse(camera_id, "event message", payload)?;
        let camera_id = camera_id.to_string();
        let event_id = message.after.id;
        Ok(match message.kind {
            NvrEventMessageKind::New => CameraEvent::New { camera_id, event_id },
            NvrEventMessageKind::Update => CameraEvent::Update { camera_id, event_id },
            NvrEventMessageKind::End => CameraEvent::End { camera_id, event_id },
        })
    }

    async fn send(&self, camera_id: &str, request: &NvrRequest) -> Result<String> {
        trace!(camera = camera_id, request = request.name(), "NVR request");
        self.transport
            .request(request)
            .await
            .map_err(|err| map_transport_error(camera_id, request, err))
    }

    fn camera_name(camera: &Camera) -> String {
        camera.config().nvr_camera_name().unwrap_or_else(|| camera.id().to_string())
    }

    fn event_to_media(camera: &Camera, query: &EventQuery, event: &NvrEvent) -> Option<ViewMedia> {
        let kind = if query.media_kind() == MediaKind::Snapshot {
            event.has_snapshot.then_some(MediaKind::Snapshot)?
        } else if event.has_clip {
            MediaKind::Clip
        } else if event.has_snapshot && query.has_clip != Some(true) {
            MediaKind::Snapshot
        } else {
            return None;
        };

        let content = match kind {
            MediaKind::Snapshot => format!("events/{}/snapshot.jpg", event.id),
            _ => format!("events/{}/clip.mp4", event.id),
        };

        let mut media = ViewMedia::new(kind, camera.id(), content)
            .with_id(event.id.clone())
            .with_end_time(event.end_time.and_then(from_epoch_seconds))
            .with_title(event.title())
            .with_thumbnail(format!("events/{}/thumbnail.jpg", event.id))
            .with_favorite(event.retain_indefinitely);
        if let Some(start) = from_epoch_seconds(event.start_time) {
            media = media.with_start_time(start);
        }
        Some(media)
    }

    fn recording_to_media(camera: &Camera, segment: &NvrRecordingSegment) -> Option<ViewMedia> {
        let start = from_epoch_seconds(segment.start_time)?;
        let seconds = start.timestamp();
        let title = match segment.events {
            1 => "1 event".to_string(),
            n => format!("{n} events"),
        };
        Some(
            ViewMedia::new(MediaKind::Recording, camera.id(), format!("recordings/{}/{}", camera.id(), seconds))
                .with_id(format!("{}-{}", camera.id(), seconds))
                .with_start_time(start)
                .with_end_time(from_epoch_seconds(segment.end_time))
                .with_title(title),
        )
    }
}

#[async_trait::async_trait]
impl CameraEngine for NvrEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Nvr
    }

    async fn capabilities(&self, config: &CameraConfig) -> Result<Capabilities> {
        let camera_id = config.derive_id()?;
        let camera = config.nvr_camera_name().unwrap_or_else(|| camera_id.clone());
        let body = self.send(&camera_id, &NvrRequest::CameraConfig { camera }).await?;
        let probe: NvrCameraProbe = parse(&camera_id, "camera config", &body)?;

        let mut caps = vec![Capability::Live, Capability::Clips, Capability::FavoriteEvents];
        if probe.snapshots_enabled {
            caps.push(Capability::Snapshots);
        }
        if probe.record_enabled {
            caps.push(Capability::Recordings);
            caps.push(Capability::Seek);
        }
        let capabilities = config.capabilities.apply(caps.into_iter().collect());
        debug!(camera = %camera_id, ?capabilities, "Probed NVR capabilities");
        Ok(capabilities)
    }

    async fn fetch_events(&self, camera: &Camera, query: &EventQuery) -> Result<Vec<ViewMedia>> {
        let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
        let nvr_config = camera.config().nvr.clone().unwrap_or_default();
        let labels = if query.labels.is_empty() {
            nvr_config.labels.iter().cloned().collect()
        } else {
            query.labels.clone()
        };
        let zones = if query.zones.is_empty() {
            nvr_config.zones.iter().cloned().collect()
        } else {
            query.zones.clone()
        };

        let mut media = Vec::new();
        let mut seen = BTreeSet::new();
        let mut before = query.time.end;

        while media.len() < limit {
            let page_limit = (limit - media.len()).min(self.page_size);
            let request = NvrRequest::Events {
                camera: Self::camera_name(camera),
                after: query.time.start,
                before,
                labels: labels.clone(),
                zones: zones.clone(),
                has_clip: query.has_clip,
                has_snapshot: query.has_snapshot,
                favorites: query.favorite,
                limit: page_limit,
            };
            let body = self.send(camera.id(), &request).await?;
            let page: Vec<NvrEvent> = parse(camera.id(), "events", &body)?;
            let page_len = page.len();

            let oldest = page
                .iter()
                .filter_map(|event| from_epoch_seconds(event.start_time))
                .min();
            let mut new_ids = 0;
            for event in &page {
                if !seen.insert(event.id.clone()) {
                    continue;
                }
                new_ids += 1;
                if let Some(item) = Self::event_to_media(camera, query, event) {
                    media.push(item);
                    if media.len() >= limit {
                        break;
                    }
                }
            }

            // A short page means the backend has nothing older.
            let Some(oldest) = oldest else { break };
            if page_len < page_limit {
                break;
            }
            // The cursor is strict, so step just past the oldest start time to
            // pick up events sharing it that did not fit on this page. Once a
            // page brings nothing new, move strictly past that time.
            let next = if new_ids > 0 {
                let inclusive = oldest + TimeDelta::microseconds(1);
                query.time.end.map_or(inclusive, |end| inclusive.min(end))
            } else {
                oldest
            };
            if before.is_some_and(|before| next >= before) && new_ids == 0 {
                break;
            }
            before = Some(next);
        }

        debug!(camera = camera.id(), count = media.len(), "Fetched NVR events");
        Ok(media)
    }

    async fn fetch_recordings(
        &self,
        camera: &Camera,
        query: &RecordingQuery,
    ) -> Result<Vec<ViewMedia>> {
        if !camera.has_capability(Capability::Recordings) {
            return Ok(Vec::new());
        }
        let request = NvrRequest::Recordings {
            camera: Self::camera_name(camera),
            after: query.time.start,
            before: query.time.end,
        };
        let body = self.send(camera.id(), &request).await?;
        let segments: Vec<NvrRecordingSegment> = parse(camera.id(), "recordings", &body)?;

        let mut media: Vec<ViewMedia> = segments
            .iter()
            .filter_map(|segment| Self::recording_to_media(camera, segment))
            .filter(|item| query.time.overlaps(item.start_time(), item.end_time()))
            .collect();

        // Keep the most recent segments when limited.
        if let Some(limit) = query.limit {
            media.sort_by(|a, b| b.start_time().cmp(&a.start_time()));
            media.truncate(limit);
        }
        debug!(camera = camera.id(), count = media.len(), "Fetched NVR recordings");
        Ok(media)
    }

    async fn resolve_media(&self, camera: &Camera, media: &ViewMedia) -> Result<ResolvedMedia> {
        let request = NvrRequest::ResolveMedia {
            camera: Self::camera_name(camera),
            path: media.content_id().to_string(),
        };
        let body = self.send(camera.id(), &request).await?;
        let resolved: NvrResolvedPath = parse(camera.id(), "resolved media", &body)?;
        Ok(ResolvedMedia { url: resolved.url, mime_type: resolved.mime_type })
    }

    async fn set_favorite(&self, camera: &Camera, media: &ViewMedia, favorite: bool) -> Result<()> {
        let event_id = match (media.kind(), media.id()) {
            (MediaKind::Clip | MediaKind::Snapshot, Some(id)) => id.to_string(),
            _ => return Err(DeckError::unsupported("favorite recordings", self.kind().as_str())),
        };
        let request = NvrRequest::SetRetain {
            camera: Self::camera_name(camera),
            event_id,
            retain: favorite,
        };
        self.send(camera.id(), &request).await?;
        debug!(camera = camera.id(), media = ?media.id(), favorite, "Updated NVR retain flag");
        Ok(())
    }

    fn media_capabilities(&self, camera: &Camera, media: &ViewMedia) -> MediaCapabilities {
        let is_event = matches!(media.kind(), MediaKind::Clip | MediaKind::Snapshot);
        MediaCapabilities {
            can_favorite: is_event && camera.has_capability(Capability::FavoriteEvents),
            can_download: media.id().is_some() && !media.in_progress(),
        }
    }
}

fn parse<T: DeserializeOwned>(camera_id: &str, context: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|err| DeckError::malformed_payload(camera_id, context, err.to_string()))
}

fn map_transport_error(camera_id: &str, request: &NvrRequest, err: TransportError) -> DeckError {
    match err {
        TransportError::Unauthorized(reason) => DeckError::auth_failed(camera_id, reason),
        TransportError::NotFound(what) if matches!(request, NvrRequest::ResolveMedia { .. }) => {
            DeckError::UnresolvableMedia { camera_id: camera_id.to_string(), media: what }
        }
        other => DeckError::transport_failed_with_source(
            camera_id,
            format!("{} request failed", request.name()),
            Box::new(other),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NvrCameraConfig;
    use crate::test_utils::FakeNvrTransport;

    fn nvr_camera(engine: Arc<NvrEngine>, caps: Capabilities) -> Camera {
        let config = CameraConfig {
            id: Some("front".into()),
            nvr: Some(NvrCameraConfig {
                camera_name: Some("front_door".into()),
                labels: vec!["person".into()],
                ..Default::default()
            }),
            ..Default::default()
        };
        Camera::new("front", config, engine, caps)
    }

    fn event_json(id: &str, start: f64, has_clip: bool, has_snapshot: bool) -> String {
        format!(
            r#"{{"id":"{id}","camera":"front_door","label":"person","start_time":{start},"end_time":{end},"has_clip":{has_clip},"has_snapshot":{has_snapshot}}}"#,
            end = start + 5.0
        )
    }

    #[tokio::test]
    async fn events_paginate_with_before_cursor() {
        let transport = Arc::new(FakeNvrTransport::new(|request| match request {
            NvrRequest::Events { before: None, .. } => Ok(format!(
                "[{},{}]",
                event_json("e3", 300.0, true, true),
                event_json("e2", 200.0, true, true)
            )),
            NvrRequest::Events { before: Some(_), .. } => {
                Ok(format!("[{}]", event_json("e1", 100.0, true, true)))
            }
            _ => Err(TransportError::NotFound("unexpected".into())),
        }));
        let engine = Arc::new(NvrEngine::new(transport.clone()).with_page_size(2));
        let camera = nvr_camera(engine.clone(), Capabilities::all());

        let query = EventQuery { has_clip: Some(true), limit: Some(10), ..EventQuery::for_cameras(["front"]) };
        let media = engine.fetch_events(&camera, &query).await.unwrap();

        let ids: Vec<_> = media.iter().map(|m| m.id().unwrap()).collect();
        assert_eq!(ids, vec!["e3", "e2", "e1"]);
        assert!(media.iter().all(|m| m.kind() == MediaKind::Clip && m.camera_id() == "front"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        match &requests[0] {
            NvrRequest::Events { camera, labels, limit, .. } => {
                assert_eq!(camera, "front_door");
                assert!(labels.contains("person"));
                assert_eq!(*limit, 2);
            }
            other => panic!("unexpected request {other:?}"),
        }
        match &requests[1] {
            NvrRequest::Events { before, .. } => {
                assert_eq!(before.unwrap().timestamp(), 200);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn events_sharing_a_start_time_across_pages_are_all_fetched() {
        let stored = [("e3", 300.0), ("e2", 200.0), ("e2b", 200.0), ("e1", 100.0)];
        let transport = Arc::new(FakeNvrTransport::new(move |request| match request {
            NvrRequest::Events { before, limit, .. } => {
                let cutoff = before.map(|b| b.timestamp_micros() as f64 / 1e6);
                let page: Vec<String> = stored
                    .iter()
                    .filter(|(_, start)| cutoff.is_none_or(|cutoff| *start < cutoff))
                    .take(*limit)
                    .map(|(id, start)| event_json(id, *start, true, true))
                    .collect();
                Ok(format!("[{}]", page.join(",")))
            }
            _ => Err(TransportError::NotFound("unexpected".into())),
        }));
        let engine = Arc::new(NvrEngine::new(transport.clone()).with_page_size(2));
        let camera = nvr_camera(engine.clone(), Capabilities::all());

        let query = EventQuery { has_clip: Some(true), limit: Some(10), ..EventQuery::for_cameras(["front"]) };
        let media = engine.fetch_events(&camera, &query).await.unwrap();

        let ids: Vec<_> = media.iter().map(|m| m.id().unwrap()).collect();
        assert_eq!(ids, vec!["e3", "e2", "e2b", "e1"]);
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn snapshot_queries_skip_events_without_snapshots() {
        let transport = Arc::new(FakeNvrTransport::new(|_| {
            Ok(format!(
                "[{},{}]",
                event_json("a", 10.0, true, false),
                event_json("b", 20.0, false, true)
            ))
        }));
        let engine = Arc::new(NvrEngine::new(transport));
        let camera = nvr_camera(engine.clone(), Capabilities::all());

        let query = EventQuery { has_snapshot: Some(true), ..EventQuery::for_cameras(["front"]) };
        let media = engine.fetch_events(&camera, &query).await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].kind(), MediaKind::Snapshot);
        assert_eq!(media[0].content_id(), "events/b/snapshot.jpg");
    }

    #[tokio::test]
    async fn empty_listing_is_not_an_error() {
        let engine = Arc::new(NvrEngine::new(Arc::new(FakeNvrTransport::new(|_| Ok("[]".into())))));
        let camera = nvr_camera(engine.clone(), Capabilities::all());
        let media = engine.fetch_events(&camera, &EventQuery::default()).await.unwrap();
        assert!(media.is_empty());
    }

    #[tokio::test]
    async fn failures_are_distinct() {
        let cases = [
            (Err(TransportError::Unauthorized("token expired".into())), "auth"),
            (Err(TransportError::Network("reset".into())), "transport"),
            (Ok("{not json".to_string()), "malformed"),
        ];
        for (response, expected) in cases {
            let engine = Arc::new(NvrEngine::new(Arc::new(FakeNvrTransport::new(move |_| {
                response.clone()
            }))));
            let camera = nvr_camera(engine.clone(), Capabilities::all());
            let err = engine.fetch_events(&camera, &EventQuery::default()).await.unwrap_err();
            let matched = match expected {
                "auth" => matches!(err, DeckError::Auth { .. }),
                "transport" => matches!(err, DeckError::Transport { .. }) && err.is_retryable(),
                _ => matches!(err, DeckError::MalformedPayload { .. }),
            };
            assert!(matched, "expected {expected}, got {err:?}");
            assert!(err.is_backend());
        }
    }

    #[tokio::test]
    async fn capabilities_follow_probe_and_overrides() {
        let transport = Arc::new(FakeNvrTransport::new(|request| match request {
            NvrRequest::CameraConfig { .. } => Ok(r#"{"record_enabled":true}"#.into()),
            _ => Err(TransportError::NotFound("unexpected".into())),
        }));
        let engine = NvrEngine::new(transport);
        let mut config = CameraConfig { id: Some("front".into()), ..Default::default() };

        let caps = engine.capabilities(&config).await.unwrap();
        assert!(caps.has(Capability::Recordings));
        assert!(caps.has(Capability::Seek));
        assert!(caps.has(Capability::Snapshots));
        assert!(!caps.has(Capability::FavoriteRecordings));

        config.capabilities.disable = vec![Capability::Seek];
        let caps = engine.capabilities(&config).await.unwrap();
        assert!(!caps.has(Capability::Seek));
    }

    #[tokio::test]
    async fn recordings_map_to_segments() {
        let transport = Arc::new(FakeNvrTransport::new(|_| {
            Ok(r#"[{"start_time":3600,"end_time":7199,"events":2},{"start_time":7200,"end_time":10799,"events":1}]"#.into())
        }));
        let engine = Arc::new(NvrEngine::new(transport));
        let camera = nvr_camera(engine.clone(), Capabilities::all());

        let query = RecordingQuery { limit: Some(1), ..RecordingQuery::for_cameras(["front"]) };
        let media = engine.fetch_recordings(&camera, &query).await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].id(), Some("front-7200"));
        assert_eq!(media[0].title(), Some("1 event"));

        let no_recordings = nvr_camera(engine.clone(), Capabilities::none());
        assert!(engine.fetch_recordings(&no_recordings, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_missing_media_is_unresolvable() {
        let transport = Arc::new(FakeNvrTransport::new(|request| match request {
            NvrRequest::ResolveMedia { path, .. } if path.contains("gone") => {
                Err(TransportError::NotFound(path.clone()))
            }
            _ => Ok(r#"{"url":"https://nvr/signed/clip.mp4","mime_type":"video/mp4"}"#.into()),
        }));
        let engine = Arc::new(NvrEngine::new(transport));
        let camera = nvr_camera(engine.clone(), Capabilities::all());

        let present = ViewMedia::new(MediaKind::Clip, "front", "events/e1/clip.mp4");
        let resolved = engine.resolve_media(&camera, &present).await.unwrap();
        assert_eq!(resolved.url, "https://nvr/signed/clip.mp4");

        let gone = ViewMedia::new(MediaKind::Clip, "front", "events/gone/clip.mp4");
        let err = engine.resolve_media(&camera, &gone).await.unwrap_err();
        assert!(matches!(err, DeckError::UnresolvableMedia { .. }));
        assert!(!err.is_backend());
    }

    #[tokio::test]
    async fn favorites_only_apply_to_events() {
        let transport = Arc::new(FakeNvrTransport::new(|_| Ok("{}".into())));
        let engine = Arc::new(NvrEngine::new(transport.clone()));
        let camera = nvr_camera(engine.clone(), Capabilities::all());

        let clip = ViewMedia::new(MediaKind::Clip, "front", "c").with_id("e1");
        engine.set_favorite(&camera, &clip, true).await.unwrap();
        assert!(matches!(
            transport.requests().last(),
            Some(NvrRequest::SetRetain { retain: true, event_id, .. }) if event_id == "e1"
        ));

        let recording = ViewMedia::new(MediaKind::Recording, "front", "r").with_id("front-1");
        let err = engine.set_favorite(&camera, &recording, true).await.unwrap_err();
        assert!(matches!(err, DeckError::Unsupported { .. }));

        assert!(engine.media_capabilities(&camera, &clip).can_favorite);
        assert!(!engine.media_capabilities(&camera, &recording).can_favorite);
    }

    #[test]
    fn push_messages_become_camera_events() {
        let event = NvrEngine::parse_event_message(
            "front",
            r#"{"type":"end","after":{"id":"e9","camera":"front_door"}}"#,
        )
        .unwrap();
        assert_eq!(event, CameraEvent::End { camera_id: "front".into(), event_id: "e9".into() });

        let err = NvrEngine::parse_event_message("front", r#"{"type":"exploded"}"#).unwrap_err();
        assert!(matches!(err, DeckError::MalformedPayload { .. }));
    }
}
