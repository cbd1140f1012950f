//! Backend-native NVR payloads

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// One detection event as reported by the NVR.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NvrEvent {
    pub id: String,
    pub camera: String,
    pub label: String,
    #[serde(default)]
    pub sub_label: Option<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub has_clip: bool,
    #[serde(default)]
    pub has_snapshot: bool,
    #[serde(default)]
    pub retain_indefinitely: bool,
    #[serde(default)]
    pub top_score: Option<f64>,
}

impl NvrEvent {
    /// Human readable title, e.g. `Person 84%`.
    pub fn title(&self) -> String {
        let mut label = capitalize(self.sub_label.as_deref().unwrap_or(&self.label));
        if let Some(score) = self.top_score {
            label = format!("{} {}%", label, (score * 100.0).round() as i64);
        }
        label
    }
}

/// One hourly recording segment summary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NvrRecordingSegment {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub events: u32,
}

/// Per-camera backend settings relevant to capabilities.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NvrCameraProbe {
    #[serde(default)]
    pub record_enabled: bool,
    #[serde(default = "default_true")]
    pub snapshots_enabled: bool,
}

/// Response to a media resolution request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NvrResolvedPath {
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Push notification for an event lifecycle change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NvrEventMessage {
    #[serde(rename = "type")]
    pub kind: NvrEventMessageKind,
    pub after: NvrEventRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NvrEventMessageKind {
    New,
    Update,
    End,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NvrEventRef {
    pub id: String,
    pub camera: String,
}

fn default_true() -> bool {
    true
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert NVR epoch seconds into a UTC timestamp.
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}
