//! Core value types shared by engines, the camera manager and views.
//!
//! - [`Capabilities`] is an immutable capability bitset with per-key intersection
//! - [`ViewMedia`] is one normalized media item with its identity rule ([`MediaKey`])
//! - [`MediaQuery`] wraps [`EventQuery`] and [`RecordingQuery`] value objects
//! - [`HostState`] and friends describe state pushed in by the host

mod capabilities;
mod host;
mod media;
mod query;

pub use capabilities::{Capabilities, Capability};
pub use host::{EntityState, HostState, MediaLoadedInfo, MicrophoneState, User};
pub use media::{MediaKey, MediaKind, ViewMedia};
pub use query::{EventQuery, MediaQuery, RecordingQuery, TimeRange};
