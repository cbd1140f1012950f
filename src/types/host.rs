//! State pushed in by the host dashboard and device controllers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// State of one host entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self { state: state.into(), attributes: serde_json::Map::new() }
    }

    /// Numeric reading of the state, if it parses as a number.
    pub fn numeric(&self) -> Option<f64> {
        self.state.trim().parse().ok()
    }
}

/// Snapshot of host entity states.
///
/// Each host push replaces the snapshot wholesale. Entities are shared behind
/// `Arc` so that unchanged entities are cheap to compare between pushes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostState {
    entities: HashMap<String, Arc<EntityState>>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>, state: EntityState) -> Self {
        self.entities.insert(entity_id.into(), Arc::new(state));
        self
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether any of `entity_ids` differs between two snapshots.
    pub fn differs_for<'a, I>(&self, other: &HostState, entity_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        entity_ids.into_iter().any(|id| {
            match (self.entities.get(id.as_str()), other.entities.get(id.as_str())) {
                (Some(a), Some(b)) => !Arc::ptr_eq(a, b) && a != b,
                (None, None) => false,
                _ => true,
            }
        })
    }
}

impl FromIterator<(String, EntityState)> for HostState {
    fn from_iter<I: IntoIterator<Item = (String, EntityState)>>(iter: I) -> Self {
        Self { entities: iter.into_iter().map(|(id, state)| (id, Arc::new(state))).collect() }
    }
}

/// The user viewing the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Microphone state reported by the microphone controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrophoneState {
    pub connected: bool,
    pub muted: bool,
    pub forbidden: bool,
}

/// Details of the media element that finished loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaLoadedInfo {
    pub width: u32,
    pub height: u32,
}

impl MediaLoadedInfo {
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height != 0).then(|| self.width as f64 / self.height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differs_only_for_watched_entities() {
        let before = HostState::new()
            .with_entity("light.porch", EntityState::new("on"))
            .with_entity("sensor.temp", EntityState::new("20"));
        let after = before.clone().with_entity("sensor.temp", EntityState::new("21"));

        let porch = vec!["light.porch".to_string()];
        let temp = vec!["sensor.temp".to_string()];
        assert!(!before.differs_for(&after, &porch));
        assert!(before.differs_for(&after, &temp));
    }

    #[test]
    fn appearing_entity_counts_as_difference() {
        let before = HostState::new();
        let after = HostState::new().with_entity("switch.siren", EntityState::new("off"));
        assert!(before.differs_for(&after, &vec!["switch.siren".to_string()]));
    }

    #[test]
    fn numeric_state_parses() {
        assert_eq!(EntityState::new(" 21.5 ").numeric(), Some(21.5));
        assert_eq!(EntityState::new("unavailable").numeric(), None);
    }
}
