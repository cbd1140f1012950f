//! Declarative conditions

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ConditionState;
use crate::view::ViewMode;

/// A declarative predicate over the current [`ConditionState`].
///
/// ```rust
/// use camdeck::conditions::Condition;
///
/// let condition: Condition = serde_yaml_ng::from_str(r#"
/// condition: and
/// conditions:
///   - condition: view
///     views: [clips, snapshots]
///   - condition: state
///     entity: binary_sensor.door
///     state: ["on"]
/// "#).unwrap();
/// assert!(matches!(condition, Condition::And { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Condition {
    /// The view is focused on one of `cameras`.
    Camera { cameras: Vec<String> },
    /// The view mode is one of `views`.
    View { views: Vec<ViewMode> },
    /// A host entity matches every given test.
    State {
        entity: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state_not: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        above: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        below: Option<f64>,
    },
    UserIsAdmin { admin: bool },
    /// The current user id is one of `users`.
    Users { users: Vec<String> },
    Expand { expand: bool },
    Fullscreen { fullscreen: bool },
    Microphone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connected: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        muted: Option<bool>,
    },
    MediaLoaded { media_loaded: bool },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
    /// None of `conditions` holds.
    Not { conditions: Vec<Condition> },
}

impl Condition {
    /// Evaluate against `state`. `and` and `or` stop at the first deciding
    /// child in declaration order.
    pub fn evaluate(&self, state: &ConditionState) -> bool {
        match self {
            Condition::Camera { cameras } => state
                .view
                .as_ref()
                .and_then(|view| view.camera().id())
                .is_some_and(|id| cameras.iter().any(|camera| camera == id)),
            Condition::View { views } => {
                state.view.as_ref().is_some_and(|view| views.contains(&view.mode()))
            }
            Condition::State { entity, state: one_of, state_not, above, below } => {
                let Some(entity) = state.host.get(entity) else {
                    return false;
                };
                if one_of.as_ref().is_some_and(|states| !states.contains(&entity.state)) {
                    return false;
                }
                if state_not.as_ref().is_some_and(|states| states.contains(&entity.state)) {
                    return false;
                }
                if above.is_some() || below.is_some() {
                    let Some(value) = entity.numeric() else {
                        return false;
                    };
                    if above.is_some_and(|limit| value <= limit) || below.is_some_and(|limit| value >= limit) {
                        return false;
                    }
                }
                true
            }
            Condition::UserIsAdmin { admin } => {
                state.user.as_ref().is_some_and(|user| user.is_admin) == *admin
            }
            Condition::Users { users } => {
                state.user.as_ref().is_some_and(|user| users.contains(&user.id))
            }
            Condition::Expand { expand } => state.expand == *expand,
            Condition::Fullscreen { fullscreen } => state.fullscreen == *fullscreen,
            Condition::Microphone { connected, muted } => {
                let microphone = state.microphone.unwrap_or_default();
                connected.is_none_or(|c| microphone.connected == c)
                    && muted.is_none_or(|m| microphone.muted == m)
            }
            Condition::MediaLoaded { media_loaded } => state.media_loaded.is_some() == *media_loaded,
            Condition::And { conditions } => conditions.iter().all(|c| c.evaluate(state)),
            Condition::Or { conditions } => conditions.iter().any(|c| c.evaluate(state)),
            Condition::Not { conditions } => !conditions.iter().any(|c| c.evaluate(state)),
        }
    }

    /// Inputs this condition reads.
    pub fn dependencies(&self) -> Dependencies {
        let mut deps = Dependencies::default();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut Dependencies) {
        match self {
            Condition::Camera { .. } => deps.camera = true,
            Condition::View { .. } => deps.view_mode = true,
            Condition::State { entity, .. } => {
                deps.entities.insert(entity.clone());
            }
            Condition::UserIsAdmin { .. } | Condition::Users { .. } => deps.user = true,
            Condition::Expand { .. } => deps.expand = true,
            Condition::Fullscreen { .. } => deps.fullscreen = true,
            Condition::Microphone { .. } => deps.microphone = true,
            Condition::MediaLoaded { .. } => deps.media_loaded = true,
            Condition::And { conditions } | Condition::Or { conditions } | Condition::Not { conditions } => {
                for condition in conditions {
                    condition.collect_dependencies(deps);
                }
            }
        }
    }
}

/// Inputs a set of conditions depends on.
///
/// Tracking is per input category plus individual host entities, so a change
/// to anything listed here triggers re-evaluation even if no condition result
/// ends up changing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub view_mode: bool,
    pub camera: bool,
    pub entities: BTreeSet<String>,
    pub user: bool,
    pub expand: bool,
    pub fullscreen: bool,
    pub microphone: bool,
    pub media_loaded: bool,
}

impl Dependencies {
    pub fn merge(&mut self, other: &Dependencies) {
        self.view_mode |= other.view_mode;
        self.camera |= other.camera;
        self.entities.extend(other.entities.iter().cloned());
        self.user |= other.user;
        self.expand |= other.expand;
        self.fullscreen |= other.fullscreen;
        self.microphone |= other.microphone;
        self.media_loaded |= other.media_loaded;
    }
}
