//! View transitions, stale query rejection and condition epochs driven through
//! the controller.

use async_trait::async_trait;
use camdeck::{
    Camera, CameraConfig, CameraEngine, Capabilities, Capability, Condition, DeckConfig, DeckController,
    DeckError, EngineFactory, EngineKind, EntityState, EventQuery, HostState, MediaKind, RecordingQuery,
    ResolvedMedia, View, ViewCamera, ViewMedia, ViewMode, ViewParameters,
};
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Engine serving fixed clips per camera after a per-camera delay.
struct DelayedEngine {
    clips: HashMap<&'static str, Vec<(&'static str, i64)>>,
    delays: HashMap<&'static str, Duration>,
}

#[async_trait]
impl CameraEngine for DelayedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Generic
    }

    async fn capabilities(&self, config: &CameraConfig) -> camdeck::Result<Capabilities> {
        Ok(config.capabilities.apply([Capability::Live, Capability::Clips].into_iter().collect()))
    }

    async fn fetch_events(&self, camera: &Camera, _query: &EventQuery) -> camdeck::Result<Vec<ViewMedia>> {
        if let Some(delay) = self.delays.get(camera.id()) {
            tokio::time::sleep(*delay).await;
        }
        let clips = self.clips.get(camera.id()).cloned().unwrap_or_default();
        Ok(clips
            .into_iter()
            .map(|(id, secs)| {
                ViewMedia::new(MediaKind::Clip, camera.id(), format!("{id}.mp4"))
                    .with_id(id)
                    .with_start_time(Utc.timestamp_opt(secs, 0).unwrap())
            })
            .collect())
    }

    async fn fetch_recordings(&self, _camera: &Camera, _query: &RecordingQuery) -> camdeck::Result<Vec<ViewMedia>> {
        Ok(Vec::new())
    }

    async fn resolve_media(&self, _camera: &Camera, media: &ViewMedia) -> camdeck::Result<ResolvedMedia> {
        Ok(ResolvedMedia { url: media.content_id().to_string(), mime_type: None })
    }
}

const CONFIG: &str = r#"
cameras:
  - id: kitchen
    engine: generic
  - id: garage
    engine: generic
view:
  default: clips
  camera: garage
  media_limit: 10
"#;

async fn controller() -> DeckController {
    let _ = tracing_subscriber::fmt::try_init();
    let engine = DelayedEngine {
        clips: HashMap::from([
            ("kitchen", vec![("k1", 100), ("k2", 200)]),
            ("garage", vec![("g1", 150)]),
        ]),
        delays: HashMap::from([
            ("kitchen", Duration::from_secs(5)),
            ("garage", Duration::from_millis(10)),
        ]),
    };
    let engines = EngineFactory::new().with_engine(EngineKind::Generic, Arc::new(engine));
    let (controller, report) = DeckController::from_config(engines, &DeckConfig::from_yaml(CONFIG).unwrap())
        .await
        .unwrap();
    assert_eq!(report.added, vec!["kitchen", "garage"]);
    controller
}

fn clips_params(camera: &str) -> ViewParameters {
    let query = ViewMode::Clips.default_query([camera], 10).unwrap();
    ViewParameters::new(ViewMode::Clips, ViewCamera::single(camera)).with_query(query)
}

#[tokio::test(start_paused = true)]
async fn default_view_shows_configured_camera() {
    let controller = controller().await;
    let view = controller.view().unwrap();
    assert_eq!(view.mode(), ViewMode::Clips);
    assert_eq!(view.camera(), &ViewCamera::single("garage"));
    assert_eq!(view.selected_media().and_then(ViewMedia::id), Some("g1"));
}

#[tokio::test(start_paused = true)]
async fn slow_superseded_query_never_overwrites_newer_view() {
    let mut controller = controller().await;

    // Start a slow kitchen query and let it run in the background.
    let slow = controller.begin_query(clips_params("kitchen")).unwrap();
    let cameras = Arc::clone(controller.cameras());
    let slow_query = slow.query().clone();
    let slow_task = tokio::spawn(async move { cameras.execute_query(&slow_query).await });

    // The user moves to the garage before the kitchen answers.
    let fast = controller.begin_query(clips_params("garage")).unwrap();
    assert!(slow.is_cancelled());
    let fast_outcome = controller.cameras().execute_query(fast.query()).await;
    assert!(controller.complete_query(fast, fast_outcome));

    let slow_outcome = slow_task.await.unwrap();
    assert_eq!(slow_outcome.results.len(), 2);
    assert!(!controller.complete_query(slow, slow_outcome));

    let view = controller.view().unwrap();
    assert_eq!(view.camera(), &ViewCamera::single("garage"));
    assert_eq!(view.selected_media().and_then(ViewMedia::id), Some("g1"));
}

#[tokio::test(start_paused = true)]
async fn superseded_query_is_cancelled_in_flight() {
    let mut controller = controller().await;
    let slow = controller.begin_query(clips_params("kitchen")).unwrap();
    let cameras = Arc::clone(controller.cameras());
    let query = slow.query().clone();
    let cancel = slow.cancel_token().clone();
    let task = tokio::spawn(async move { cameras.execute_query_cancellable(&query, &cancel).await });

    controller.set_view(View::simple(ViewMode::Live, ViewCamera::single("garage")).unwrap()).unwrap();
    let result = task.await.unwrap();
    assert!(matches!(result, Err(DeckError::Cancelled)));
    assert!(controller.view().unwrap().query().is_none());
}

#[tokio::test(start_paused = true)]
async fn irrelevant_host_pushes_do_not_advance_epoch() {
    let mut controller = controller().await;
    controller.register_condition(Condition::State {
        entity: "binary_sensor.garage_door".into(),
        state: Some(vec!["on".into()]),
        state_not: None,
        above: None,
        below: None,
    });
    let epoch = controller.conditions().epoch();

    for temperature in 0..20 {
        controller.set_host_state(
            HostState::new()
                .with_entity("binary_sensor.garage_door", EntityState::new("off"))
                .with_entity("sensor.temperature", EntityState::new(temperature.to_string())),
        );
    }
    assert_eq!(controller.conditions().epoch(), epoch);

    controller.set_host_state(HostState::new().with_entity("binary_sensor.garage_door", EntityState::new("on")));
    assert_eq!(controller.conditions().epoch(), epoch + 1);
}

#[tokio::test(start_paused = true)]
async fn epoch_stream_reports_view_driven_changes() {
    let mut controller = controller().await;
    let live = Condition::View { views: vec![ViewMode::Live] };
    controller.register_condition(live.clone());
    let mut epochs = controller.conditions().epoch_updates();
    let start = epochs.next().await.unwrap();

    controller.set_view(View::simple(ViewMode::Live, ViewCamera::single("kitchen")).unwrap()).unwrap();
    assert!(controller.evaluate_condition(&live));
    assert_eq!(epochs.next().await, Some(start + 1));
}

#[tokio::test(start_paused = true)]
async fn unknown_camera_transition_is_rejected() {
    let mut controller = controller().await;
    let before = controller.view().unwrap();
    let err = controller
        .set_view(View::simple(ViewMode::Live, ViewCamera::single("attic")).unwrap())
        .unwrap_err();
    assert!(matches!(err, DeckError::UnknownCamera { .. }));
    assert_eq!(controller.view().unwrap(), before);
}
