//! Camera dashboard core: multi-backend media aggregation and view state.
//!
//! camdeck keeps one consistent view of what a dashboard user is looking at,
//! backed by media pulled from several independent camera backends, and tells
//! dependents cheaply when anything they render may have changed.
//!
//! # Features
//!
//! - **Camera aggregation**: heterogeneous engines behind one query interface,
//!   fanned out concurrently with per-camera failure isolation
//! - **Deterministic merging**: results sorted, deduplicated and navigable in
//!   [`MediaQueriesResults`] regardless of backend completion order
//! - **Immutable views**: a single writer publishes every [`View`] over `watch`
//!   channels and rejects stale query results
//! - **Declarative conditions**: an epoch that only advances when a registered
//!   condition actually changes result
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use camdeck::{DeckConfig, DeckController, EngineFactory};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeckConfig::from_yaml(
//!         "cameras:\n  - id: garden\n    engine: generic\nview:\n  default: live\n",
//!     )?;
//!     let (controller, report) = DeckController::from_config(EngineFactory::new(), &config).await?;
//!     println!("{} cameras ready", report.added.len());
//!
//!     let mut views = Box::pin(controller.views().view_updates());
//!     while let Some(view) = views.next().await {
//!         println!("Showing {} on {}", view.mode(), view.camera());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Configuration
pub mod config;

// Camera aggregation
pub mod camera;
pub mod engine;
pub mod engines;
pub mod manager;
pub mod store;

// View state and conditions
pub mod conditions;
pub mod controller;
pub mod view;

// Core exports
pub use error::*;
pub use types::*;

pub use camera::{Camera, CameraEvent, CameraEventCallback};
pub use conditions::{Condition, ConditionsManager};
pub use config::{CameraConfig, DeckConfig, EngineKind, ViewConfig};
pub use controller::DeckController;
pub use engine::{CameraEngine, MediaCapabilities, ResolvedMedia};
pub use engines::{EngineFactory, GenericEngine, NvrEngine, NvrTransport};
pub use manager::{CameraFailure, CameraManager, InitReport, QueryOutcome};
pub use store::CameraStore;
pub use view::{MediaQueriesResults, QueryTicket, View, ViewCamera, ViewContext, ViewManager, ViewMode, ViewParameters};
