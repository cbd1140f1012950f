//! Camera engine implementations.
//!
//! - [`NvrEngine`]: network video recorder backends with events and recordings
//! - [`GenericEngine`]: live-only cameras
//!
//! [`EngineFactory`] hands out one shared instance per engine kind.

mod generic;
pub mod nvr;

pub use generic::GenericEngine;
pub use nvr::{NvrEngine, NvrTransport};

use std::sync::Arc;

use crate::config::EngineKind;
use crate::engine::CameraEngine;
use crate::{DeckError, Result};

/// Builds and caches engines by kind.
#[derive(Default)]
pub struct EngineFactory {
    nvr: Option<Arc<dyn CameraEngine>>,
    generic: Option<Arc<dyn CameraEngine>>,
}

impl EngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable NVR cameras, talking to the backend through `transport`.
    pub fn with_nvr_transport(mut self, transport: Arc<dyn NvrTransport>) -> Self {
        self.nvr = Some(Arc::new(NvrEngine::new(transport)));
        self
    }

    /// Use a custom engine for `kind`.
    pub fn with_engine(mut self, kind: EngineKind, engine: Arc<dyn CameraEngine>) -> Self {
        match kind {
            EngineKind::Nvr => self.nvr = Some(engine),
            EngineKind::Generic => self.generic = Some(engine),
        }
        self
    }

    /// Engine for `kind`, creating the generic engine on first use.
    pub fn engine(&mut self, kind: EngineKind) -> Result<Arc<dyn CameraEngine>> {
        match kind {
            EngineKind::Nvr => self.nvr.clone().ok_or_else(|| {
                DeckError::invalid_config("nvr cameras configured but no NVR transport available")
            }),
            EngineKind::Generic => Ok(Arc::clone(
                self.generic.get_or_insert_with(|| Arc::new(GenericEngine::new())),
            )),
        }
    }
}

impl std::fmt::Debug for EngineFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineFactory")
            .field("nvr", &self.nvr.is_some())
            .field("generic", &self.generic.is_some())
            .finish()
    }
}
