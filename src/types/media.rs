//! Normalized media items produced by camera engines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Kind of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Clip,
    Snapshot,
    Recording,
}

/// One normalized media item.
///
/// Created by an engine from backend-native data and treated as read-only
/// everywhere else. Builder methods consume `self`, so an item is never changed
/// once it has been handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewMedia {
    camera_id: String,
    kind: MediaKind,
    id: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    content_id: String,
    title: Option<String>,
    thumbnail: Option<String>,
    favorite: Option<bool>,
}

/// Identity of a media item for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaKey {
    /// Items with a backend id: same camera, kind and id.
    Identified { camera_id: String, kind: MediaKind, id: String },
    /// Items without an id compare by timing and content.
    Structural {
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        content_id: String,
    },
}

impl ViewMedia {
    /// Create a media item with only the required fields.
    pub fn new(kind: MediaKind, camera_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            kind,
            id: None,
            start_time: None,
            end_time: None,
            content_id: content_id.into(),
            title: None,
            thumbnail: None,
            favorite: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_end_time(mut self, end: Option<DateTime<Utc>>) -> Self {
        self.end_time = end;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    /// Re-tag the item with the camera that produced it.
    pub fn with_camera_id(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = camera_id.into();
        self
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Locator the engine resolves into playable content.
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn is_favorite(&self) -> Option<bool> {
        self.favorite
    }

    /// A started clip or recording without an end is still being written.
    /// Snapshots are instantaneous and never in progress.
    pub fn in_progress(&self) -> bool {
        self.kind != MediaKind::Snapshot && self.start_time.is_some() && self.end_time.is_none()
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, MediaKind::Clip | MediaKind::Recording)
    }

    /// Deduplication key.
    pub fn key(&self) -> MediaKey {
        match &self.id {
            Some(id) => MediaKey::Identified {
                camera_id: self.camera_id.clone(),
                kind: self.kind,
                id: id.clone(),
            },
            None => MediaKey::Structural {
                start_time: self.start_time,
                end_time: self.end_time,
                content_id: self.content_id.clone(),
            },
        }
    }

    /// Whether both items refer to the same media.
    pub fn is_same_media(&self, other: &ViewMedia) -> bool {
        self.key() == other.key()
    }

    /// Global result ordering: start time ascending (untimed first), then
    /// camera id, then content locator.
    pub fn sort_order(&self, other: &ViewMedia) -> Ordering {
        self.start_time
            .cmp(&other.start_time)
            .then_with(|| self.camera_id.cmp(&other.camera_id))
            .then_with(|| self.content_id.cmp(&other.content_id))
    }
}
