//! Controller tying the camera manager, view manager and conditions together

use std::sync::Arc;
use tracing::info;

use crate::conditions::{Condition, ConditionId, ConditionsManager};
use crate::config::DeckConfig;
use crate::engines::EngineFactory;
use crate::manager::{CameraManager, InitReport, QueryOutcome};
use crate::types::{HostState, MediaLoadedInfo, MicrophoneState, User};
use crate::view::{QueryTicket, View, ViewContext, ViewManager, ViewParameters};
use crate::Result;

/// Entry point for a dashboard card.
///
/// Every view change made through the controller is forwarded to the
/// conditions manager, and host pushes go straight to it. Switching to a
/// different media item or mode forgets the previously loaded media.
#[derive(Debug)]
pub struct DeckController {
    cameras: Arc<CameraManager>,
    views: ViewManager,
    conditions: ConditionsManager,
}

impl DeckController {
    /// Initialize cameras from `config` and show the default view.
    pub async fn from_config(engines: EngineFactory, config: &DeckConfig) -> Result<(Self, InitReport)> {
        let mut cameras = CameraManager::new(engines);
        let report = cameras.initialize(config).await?;
        let mut controller = Self::new(Arc::new(cameras), config);
        controller.set_view_default_with_new_query().await?;
        info!(cameras = controller.cameras.store().len(), "Deck ready");
        Ok((controller, report))
    }

    pub fn new(cameras: Arc<CameraManager>, config: &DeckConfig) -> Self {
        let views = ViewManager::new(Arc::clone(&cameras), config.view.clone());
        Self { cameras, views, conditions: ConditionsManager::new() }
    }

    pub fn cameras(&self) -> &Arc<CameraManager> {
        &self.cameras
    }

    pub fn views(&self) -> &ViewManager {
        &self.views
    }

    pub fn conditions(&self) -> &ConditionsManager {
        &self.conditions
    }

    pub fn view(&self) -> Option<Arc<View>> {
        self.views.view()
    }

    pub fn set_view(&mut self, view: View) -> Result<()> {
        self.views.set_view(view)?;
        self.sync_view();
        Ok(())
    }

    pub fn set_view_with_new_context(&mut self, context: ViewContext) -> Result<()> {
        self.views.set_view_with_new_context(context)?;
        self.sync_view();
        Ok(())
    }

    pub fn clear_context(&mut self) -> Result<()> {
        self.views.clear_context()?;
        self.sync_view();
        Ok(())
    }

    pub async fn set_view_default_with_new_query(&mut self) -> Result<()> {
        let result = self.views.set_view_default_with_new_query().await;
        // The view may have changed even if the query was cancelled.
        self.sync_view();
        result
    }

    pub fn begin_query(&mut self, params: ViewParameters) -> Result<QueryTicket> {
        let ticket = self.views.begin_query(params)?;
        self.sync_view();
        Ok(ticket)
    }

    pub fn complete_query(&mut self, ticket: QueryTicket, outcome: QueryOutcome) -> bool {
        let applied = self.views.complete_query(ticket, outcome);
        if applied {
            self.sync_view();
        }
        applied
    }

    /// Jump to the media at `index` (clamped).
    pub fn select_media(&mut self, index: usize) -> bool {
        let selected = self.views.select_media(index);
        if selected {
            self.sync_view();
        }
        selected
    }

    pub fn select_next(&mut self) -> bool {
        let moved = self.views.select_next();
        if moved {
            self.sync_view();
        }
        moved
    }

    pub fn select_previous(&mut self) -> bool {
        let moved = self.views.select_previous();
        if moved {
            self.sync_view();
        }
        moved
    }

    pub fn register_condition(&mut self, condition: Condition) -> ConditionId {
        self.conditions.register(condition)
    }

    pub fn unregister_condition(&mut self, id: ConditionId) -> bool {
        self.conditions.unregister(id)
    }

    pub fn evaluate_condition(&self, condition: &Condition) -> bool {
        self.conditions.evaluate_condition(condition)
    }

    pub fn set_host_state(&mut self, host: HostState) {
        self.conditions.set_host_state(host);
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.conditions.set_user(user);
    }

    pub fn set_expanded(&mut self, expand: bool) {
        self.conditions.set_expanded(expand);
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.conditions.set_fullscreen(fullscreen);
    }

    pub fn set_microphone_state(&mut self, microphone: Option<MicrophoneState>) {
        self.conditions.set_microphone_state(microphone);
    }

    pub fn set_media_loaded(&mut self, media_loaded: Option<MediaLoadedInfo>) {
        self.conditions.set_media_loaded(media_loaded);
    }

    fn sync_view(&mut self) {
        let view = self.views.view();
        let previous = self.conditions.state().view.clone();
        let same_media = match (&previous, &view) {
            (Some(old), Some(new)) => old.mode() == new.mode() && old.selected_media() == new.selected_media(),
            (None, None) => true,
            _ => false,
        };
        if !same_media {
            self.conditions.set_media_loaded(None);
        }
        self.conditions.set_view(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, EngineKind};
    use crate::test_utils::{ScriptedEngine, clip_at};
    use crate::types::{Capabilities, Capability};
    use crate::view::{ViewCamera, ViewMode};

    fn config() -> DeckConfig {
        DeckConfig::from_yaml(
            "cameras:\n  - id: front\n    engine: generic\n  - id: back\n    engine: generic\nview:\n  default: clips\n",
        )
        .unwrap()
    }

    fn engines() -> EngineFactory {
        let engine = ScriptedEngine::new()
            .with_capabilities([Capability::Live, Capability::Clips].into_iter().collect::<Capabilities>())
            .with_events("front", vec![clip_at("front", "f1", 10), clip_at("front", "f2", 20)]);
        EngineFactory::new().with_engine(EngineKind::Generic, Arc::new(engine))
    }

    #[tokio::test]
    async fn starts_on_default_view_with_results() {
        let (controller, report) = DeckController::from_config(engines(), &config()).await.unwrap();
        assert_eq!(report.added, vec!["front", "back"]);

        let view = controller.view().unwrap();
        assert_eq!(view.mode(), ViewMode::Clips);
        assert_eq!(view.camera(), &ViewCamera::single("front"));
        assert_eq!(view.results().map(|r| r.len()), Some(2));
        assert!(controller.evaluate_condition(&Condition::View { views: vec![ViewMode::Clips] }));
    }

    #[tokio::test]
    async fn view_changes_reach_conditions() {
        let (mut controller, _) = DeckController::from_config(engines(), &config()).await.unwrap();
        let id = controller.register_condition(Condition::Camera { cameras: vec!["back".into()] });
        let epoch = controller.conditions().epoch();
        assert_eq!(controller.conditions().result(id), Some(false));

        controller.set_view(View::simple(ViewMode::Live, ViewCamera::single("back")).unwrap()).unwrap();
        assert_eq!(controller.conditions().result(id), Some(true));
        assert_eq!(controller.conditions().epoch(), epoch + 1);

        // A rejected transition changes nothing.
        let bad = View::simple(ViewMode::Live, ViewCamera::single("attic")).unwrap();
        assert!(controller.set_view(bad).is_err());
        assert_eq!(controller.conditions().epoch(), epoch + 1);
    }

    #[tokio::test]
    async fn selection_change_forgets_loaded_media() {
        let (mut controller, _) = DeckController::from_config(engines(), &config()).await.unwrap();
        let id = controller.register_condition(Condition::MediaLoaded { media_loaded: true });
        controller.set_media_loaded(Some(MediaLoadedInfo { width: 640, height: 360 }));
        assert_eq!(controller.conditions().result(id), Some(true));

        // Context changes keep the loaded media.
        controller.set_view_with_new_context(ViewContext::new()).unwrap();
        assert_eq!(controller.conditions().result(id), Some(true));

        assert!(controller.select_next());
        assert_eq!(controller.conditions().result(id), Some(false));
    }

    #[tokio::test]
    async fn jumping_to_media_updates_conditions() {
        let (mut controller, _) = DeckController::from_config(engines(), &config()).await.unwrap();
        let id = controller.register_condition(Condition::MediaLoaded { media_loaded: true });
        controller.set_media_loaded(Some(MediaLoadedInfo { width: 640, height: 360 }));

        // Re-selecting the current item keeps the loaded media.
        assert!(controller.select_media(0));
        assert_eq!(controller.conditions().result(id), Some(true));

        assert!(controller.select_media(1));
        assert_eq!(controller.view().unwrap().results().unwrap().selected_index(), Some(1));
        assert_eq!(controller.conditions().result(id), Some(false));
        assert_eq!(controller.conditions().state().view, controller.view());
    }

    #[test]
    fn camera_config_is_shared_with_views() {
        let cameras = Arc::new(CameraManager::new(EngineFactory::new()));
        let controller = DeckController::new(Arc::clone(&cameras), &DeckConfig {
            cameras: vec![CameraConfig::default()],
            ..Default::default()
        });
        assert!(Arc::ptr_eq(controller.views().cameras(), &cameras));
        assert!(controller.view().is_none());
    }
}
