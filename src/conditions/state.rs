//! Inputs conditions are evaluated against

use std::sync::Arc;

use crate::types::{HostState, MediaLoadedInfo, MicrophoneState, User};
use crate::view::View;

/// Last known value of every input a condition can read.
#[derive(Debug, Clone, Default)]
pub struct ConditionState {
    pub view: Option<Arc<View>>,
    pub host: HostState,
    pub user: Option<User>,
    pub expand: bool,
    pub fullscreen: bool,
    pub microphone: Option<MicrophoneState>,
    pub media_loaded: Option<MediaLoadedInfo>,
}
