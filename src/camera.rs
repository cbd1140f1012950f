//! A camera bound to its engine and capabilities

use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::config::CameraConfig;
use crate::engine::CameraEngine;
use crate::types::{Capabilities, Capability};

/// Asynchronous notification pushed by a backend for one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// A new event started (e.g. motion detected).
    New { camera_id: String, event_id: String },
    /// An in-progress event changed.
    Update { camera_id: String, event_id: String },
    /// An event finished.
    End { camera_id: String, event_id: String },
}

impl CameraEvent {
    pub fn camera_id(&self) -> &str {
        match self {
            CameraEvent::New { camera_id, .. }
            | CameraEvent::Update { camera_id, .. }
            | CameraEvent::End { camera_id, .. } => camera_id,
        }
    }
}

/// Callback receiving [`CameraEvent`]s. The camera invokes it but does not own
/// whatever it forwards to.
pub type CameraEventCallback = Arc<dyn Fn(&CameraEvent) + Send + Sync>;

/// One camera: identity, configuration, engine and capabilities.
pub struct Camera {
    id: String,
    config: CameraConfig,
    engine: Arc<dyn CameraEngine>,
    capabilities: Capabilities,
    event_callback: Option<CameraEventCallback>,
}

impl Camera {
    pub fn new(
        id: impl Into<String>,
        config: CameraConfig,
        engine: Arc<dyn CameraEngine>,
        capabilities: Capabilities,
    ) -> Self {
        Self { id: id.into(), config, engine, capabilities, event_callback: None }
    }

    pub fn with_event_callback(mut self, callback: CameraEventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn CameraEngine> {
        &self.engine
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    /// Display title, falling back to the id.
    pub fn title(&self) -> &str {
        self.config.title.as_deref().unwrap_or(&self.id)
    }

    /// Forward a backend event to the registered callback, if any.
    pub fn notify(&self, event: &CameraEvent) {
        trace!(camera = %self.id, ?event, "Camera event");
        if let Some(callback) = &self.event_callback {
            callback(event);
        }
    }
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("id", &self.id)
            .field("engine", &self.engine.kind())
            .field("capabilities", &self.capabilities)
            .field("has_event_callback", &self.event_callback.is_some())
            .finish()
    }
}
