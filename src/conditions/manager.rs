//! Condition registry with epoch-based invalidation

use futures::Stream;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, trace};

use super::{Condition, ConditionState, Dependencies};
use crate::types::{HostState, MediaLoadedInfo, MicrophoneState, User};
use crate::view::View;

/// Handle for a registered condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConditionId(u64);

#[derive(Debug)]
struct Registered {
    condition: Condition,
    result: bool,
}

/// Evaluates conditions and tracks when their results may have changed.
///
/// The epoch starts at 0 and only ever grows. Each input update first checks
/// whether the changed input is one that some registered condition reads; only
/// then are the registered conditions re-evaluated, and the epoch is bumped if
/// at least one result differs from its cached value. Consumers that cached
/// rendering decisions at epoch `n` may keep them as long as the epoch is
/// still `n`.
pub struct ConditionsManager {
    state: ConditionState,
    conditions: BTreeMap<ConditionId, Registered>,
    dependencies: Dependencies,
    next_id: u64,
    epoch: u64,
    reevaluations: u64,
    epoch_tx: watch::Sender<u64>,
}

impl Default for ConditionsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionsManager {
    pub fn new() -> Self {
        let (epoch_tx, _) = watch::channel(0);
        Self {
            state: ConditionState::default(),
            conditions: BTreeMap::new(),
            dependencies: Dependencies::default(),
            next_id: 0,
            epoch: 0,
            reevaluations: 0,
            epoch_tx,
        }
    }

    /// Evaluate `condition` against the latest inputs.
    pub fn evaluate_condition(&self, condition: &Condition) -> bool {
        condition.evaluate(&self.state)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of times the registered conditions were re-evaluated after an
    /// input change.
    pub fn reevaluations(&self) -> u64 {
        self.reevaluations
    }

    pub fn state(&self) -> &ConditionState {
        &self.state
    }

    /// Receiver observing the epoch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.epoch_tx.subscribe()
    }

    /// Stream of epochs, starting with the current one.
    pub fn epoch_updates(&self) -> impl Stream<Item = u64> + 'static {
        WatchStream::new(self.epoch_tx.subscribe())
    }

    /// Register `condition` for tracking. Always bumps the epoch.
    pub fn register(&mut self, condition: Condition) -> ConditionId {
        let id = ConditionId(self.next_id);
        self.next_id += 1;

        self.dependencies.merge(&condition.dependencies());
        let result = condition.evaluate(&self.state);
        self.conditions.insert(id, Registered { condition, result });
        debug!(?id, result, "Condition registered");
        self.bump_epoch();
        id
    }

    /// Stop tracking a condition. Bumps the epoch if it was registered.
    pub fn unregister(&mut self, id: ConditionId) -> bool {
        if self.conditions.remove(&id).is_none() {
            return false;
        }
        self.dependencies = Dependencies::default();
        for registered in self.conditions.values() {
            self.dependencies.merge(&registered.condition.dependencies());
        }
        debug!(?id, "Condition unregistered");
        self.bump_epoch();
        true
    }

    /// Cached result of a registered condition, as of the current epoch.
    pub fn result(&self, id: ConditionId) -> Option<bool> {
        self.conditions.get(&id).map(|registered| registered.result)
    }

    pub fn set_view(&mut self, view: Option<Arc<View>>) {
        let old = self.state.view.as_deref();
        let new = view.as_deref();
        let relevant = (self.dependencies.view_mode && old.map(View::mode) != new.map(View::mode))
            || (self.dependencies.camera && old.map(View::camera) != new.map(View::camera));
        self.state.view = view;
        self.after_update("view", relevant);
    }

    pub fn set_host_state(&mut self, host: HostState) {
        let relevant = self.state.host.differs_for(&host, &self.dependencies.entities);
        self.state.host = host;
        self.after_update("host", relevant);
    }

    pub fn set_user(&mut self, user: Option<User>) {
        let relevant = self.dependencies.user && self.state.user != user;
        self.state.user = user;
        self.after_update("user", relevant);
    }

    pub fn set_expanded(&mut self, expand: bool) {
        let relevant = self.dependencies.expand && self.state.expand != expand;
        self.state.expand = expand;
        self.after_update("expand", relevant);
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        let relevant = self.dependencies.fullscreen && self.state.fullscreen != fullscreen;
        self.state.fullscreen = fullscreen;
        self.after_update("fullscreen", relevant);
    }

    pub fn set_microphone_state(&mut self, microphone: Option<MicrophoneState>) {
        let relevant = self.dependencies.microphone && self.state.microphone != microphone;
        self.state.microphone = microphone;
        self.after_update("microphone", relevant);
    }

    pub fn set_media_loaded(&mut self, media_loaded: Option<MediaLoadedInfo>) {
        let relevant = self.dependencies.media_loaded
            && self.state.media_loaded.is_some() != media_loaded.is_some();
        self.state.media_loaded = media_loaded;
        self.after_update("media_loaded", relevant);
    }

    fn after_update(&mut self, input: &'static str, relevant: bool) {
        if !relevant {
            trace!(input, "Input change irrelevant to registered conditions");
            return;
        }
        self.reevaluations += 1;

        let mut changed = false;
        for registered in self.conditions.values_mut() {
            let result = registered.condition.evaluate(&self.state);
            if result != registered.result {
                registered.result = result;
                changed = true;
            }
        }
        if changed {
            debug!(input, "Condition results changed");
            self.bump_epoch();
        }
    }

    fn bump_epoch(&mut self) {
        self.epoch += 1;
        trace!(epoch = self.epoch, "Conditions epoch advanced");
        self.epoch_tx.send_replace(self.epoch);
    }
}

impl std::fmt::Debug for ConditionsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionsManager")
            .field("epoch", &self.epoch)
            .field("conditions", &self.conditions.len())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
