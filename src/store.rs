//! Indexed, insertion-ordered camera registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::camera::Camera;
use crate::types::{Capabilities, Capability};
use crate::{DeckError, Result};

/// Registry of cameras keyed by id.
///
/// Enumeration follows insertion (configuration) order, which drives default
/// camera selection and UI ordering. Lookups by id are O(1).
#[derive(Debug, Default)]
pub struct CameraStore {
    cameras: Vec<Arc<Camera>>,
    index: HashMap<String, usize>,
}

impl CameraStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a camera. Fails without modifying the store if the id is taken.
    pub fn add_camera(&mut self, camera: Camera) -> Result<Arc<Camera>> {
        if self.index.contains_key(camera.id()) {
            return Err(DeckError::DuplicateCamera { camera_id: camera.id().to_string() });
        }
        let camera = Arc::new(camera);
        self.index.insert(camera.id().to_string(), self.cameras.len());
        self.cameras.push(Arc::clone(&camera));
        Ok(camera)
    }

    pub fn get_camera(&self, camera_id: &str) -> Option<&Arc<Camera>> {
        self.index.get(camera_id).map(|&i| &self.cameras[i])
    }

    pub fn has_camera(&self, camera_id: &str) -> bool {
        self.index.contains_key(camera_id)
    }

    /// Cameras in insertion order.
    pub fn cameras(&self) -> impl Iterator<Item = &Arc<Camera>> {
        self.cameras.iter()
    }

    /// Camera ids in insertion order.
    pub fn camera_ids(&self) -> impl Iterator<Item = &str> {
        self.cameras.iter().map(|camera| camera.id())
    }

    pub fn first_camera(&self) -> Option<&Arc<Camera>> {
        self.cameras.first()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Ids of cameras supporting `capability`, in insertion order.
    pub fn camera_ids_with_capability(&self, capability: Capability) -> Vec<String> {
        self.cameras
            .iter()
            .filter(|camera| camera.has_capability(capability))
            .map(|camera| camera.id().to_string())
            .collect()
    }

    /// Intersection of capabilities across `camera_ids`.
    ///
    /// Unknown ids and an empty selection both contribute nothing, yielding
    /// all-false capabilities for the empty case.
    pub fn aggregate_capabilities<'a, I>(&self, camera_ids: I) -> Capabilities
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut aggregate: Option<Capabilities> = None;
        for camera in camera_ids.into_iter().filter_map(|id| self.get_camera(id)) {
            let caps = camera.capabilities();
            aggregate = Some(match aggregate {
                Some(acc) => acc.intersect(&caps),
                None => caps,
            });
        }
        aggregate.unwrap_or_else(Capabilities::none)
    }

    /// Intersection across every registered camera.
    pub fn all_capabilities(&self) -> Capabilities {
        self.aggregate_capabilities(self.camera_ids())
    }
}
