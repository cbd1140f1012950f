//! Configuration consumed by the core.
//!
//! Schema validation happens upstream; this module only deserializes the
//! fields the core needs and derives camera identifiers.
//!
//! ```rust
//! use camdeck::config::{DeckConfig, EngineKind};
//! use camdeck::view::ViewMode;
//!
//! let config = DeckConfig::from_yaml(r#"
//! cameras:
//!   - engine: nvr
//!     camera_entity: camera.front_door
//!     nvr:
//!       camera_name: front_door
//!   - id: garden
//!     engine: generic
//! view:
//!   default: clips
//! "#).unwrap();
//!
//! assert_eq!(config.cameras[0].engine, EngineKind::Nvr);
//! assert_eq!(config.cameras[0].derive_id().unwrap(), "camera.front_door");
//! assert_eq!(config.view.default, ViewMode::Clips);
//! assert_eq!(config.view.media_limit, 50);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Capabilities, Capability};
use crate::view::ViewMode;
use crate::{DeckError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Cameras in display order.
    pub cameras: Vec<CameraConfig>,
    pub view: ViewConfig,
}

impl DeckConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }
}

/// Backend kind driving a camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// A network video recorder with events and recordings.
    #[default]
    Nvr,
    /// A plain live camera with no history.
    Generic,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Nvr => "nvr",
            EngineKind::Generic => "generic",
        }
    }
}

/// One configured camera.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub id: Option<String>,
    pub engine: EngineKind,
    pub camera_entity: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub nvr: Option<NvrCameraConfig>,
    pub capabilities: CapabilityOverrides,
}

impl CameraConfig {
    /// Stable camera id: explicit `id`, then the host camera entity, then the
    /// NVR camera name.
    pub fn derive_id(&self) -> Result<String> {
        self.id
            .as_deref()
            .or(self.camera_entity.as_deref())
            .or(self.nvr.as_ref().and_then(|nvr| nvr.camera_name.as_deref()))
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                DeckError::invalid_config("camera needs an id, camera_entity or nvr.camera_name")
            })
    }

    /// Name of this camera on the NVR, defaulting to the derived id.
    pub fn nvr_camera_name(&self) -> Option<String> {
        self.nvr
            .as_ref()
            .and_then(|nvr| nvr.camera_name.clone())
            .or_else(|| self.derive_id().ok())
    }
}

/// NVR-specific camera settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvrCameraConfig {
    pub camera_name: Option<String>,
    pub url: Option<String>,
    /// Default label filter applied when a query names none.
    pub labels: Vec<String>,
    /// Default zone filter applied when a query names none.
    pub zones: Vec<String>,
}

/// Per-camera capability overrides applied on top of what the engine reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityOverrides {
    pub disable: Vec<Capability>,
    pub disable_except: Option<Vec<Capability>>,
}

impl CapabilityOverrides {
    pub fn apply(&self, capabilities: Capabilities) -> Capabilities {
        let mut result = capabilities;
        for cap in &self.disable {
            result = result.without(*cap);
        }
        if let Some(keep) = &self.disable_except {
            result = result.intersect(&keep.iter().copied().collect());
        }
        result
    }
}

/// Default view settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub default: ViewMode,
    pub camera: Option<String>,
    pub media_limit: usize,
    pub wrap_navigation: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { default: ViewMode::Live, camera: None, media_limit: 50, wrap_navigation: false }
    }
}
