//! View modes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::{EventQuery, MediaKind, MediaQuery, RecordingQuery};

/// What the view is displaying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Live,
    Clip,
    Clips,
    Snapshot,
    Snapshots,
    Recording,
    Recordings,
    Image,
    Timeline,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Live => "live",
            ViewMode::Clip => "clip",
            ViewMode::Clips => "clips",
            ViewMode::Snapshot => "snapshot",
            ViewMode::Snapshots => "snapshots",
            ViewMode::Recording => "recording",
            ViewMode::Recordings => "recordings",
            ViewMode::Image => "image",
            ViewMode::Timeline => "timeline",
        }
    }

    /// Thumbnail galleries.
    pub fn is_gallery(self) -> bool {
        matches!(self, ViewMode::Clips | ViewMode::Snapshots | ViewMode::Recordings)
    }

    /// Single-item media viewers.
    pub fn is_viewer(self) -> bool {
        matches!(self, ViewMode::Clip | ViewMode::Snapshot | ViewMode::Recording)
    }

    /// Modes that may carry a query and results.
    pub fn is_media(self) -> bool {
        self.is_gallery() || self.is_viewer() || self == ViewMode::Timeline
    }

    /// Modes that can show several cameras at once.
    pub fn supports_multiple_cameras(self) -> bool {
        self.is_gallery() || self == ViewMode::Timeline
    }

    /// Media kind shown by this mode, if it is tied to one.
    pub fn media_kind(self) -> Option<MediaKind> {
        match self {
            ViewMode::Clip | ViewMode::Clips => Some(MediaKind::Clip),
            ViewMode::Snapshot | ViewMode::Snapshots => Some(MediaKind::Snapshot),
            ViewMode::Recording | ViewMode::Recordings => Some(MediaKind::Recording),
            _ => None,
        }
    }

    /// Whether `query` may back a view in this mode.
    pub fn accepts(self, query: &MediaQuery) -> bool {
        match (self.media_kind(), query) {
            (_, _) if !self.is_media() => false,
            (None, _) => true,
            (Some(MediaKind::Recording), MediaQuery::Recordings(_)) => true,
            (Some(kind), MediaQuery::Events(events)) => events.media_kind() == kind,
            _ => false,
        }
    }

    /// Default query for this mode over `cameras`, or `None` for modes
    /// without one.
    pub fn default_query<I, S>(self, cameras: I, limit: usize) -> Option<MediaQuery>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cameras: BTreeSet<String> = cameras.into_iter().map(Into::into).collect();
        let events = |has_clip: bool| {
            let mut query = EventQuery {
                cameras: cameras.clone(),
                limit: Some(limit),
                ..Default::default()
            };
            if has_clip {
                query.has_clip = Some(true);
            } else {
                query.has_snapshot = Some(true);
            }
            MediaQuery::Events(query)
        };
        match self {
            ViewMode::Clip | ViewMode::Clips | ViewMode::Timeline => Some(events(true)),
            ViewMode::Snapshot | ViewMode::Snapshots => Some(events(false)),
            ViewMode::Recording | ViewMode::Recordings => {
                Some(MediaQuery::Recordings(RecordingQuery {
                    cameras: cameras.clone(),
                    limit: Some(limit),
                    ..Default::default()
                }))
            }
            ViewMode::Live | ViewMode::Image => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_and_image_accept_no_query() {
        let query = ViewMode::Clips.default_query(["a"], 10).unwrap();
        assert!(!ViewMode::Live.accepts(&query));
        assert!(!ViewMode::Image.accepts(&query));
        assert!(ViewMode::Live.default_query(["a"], 10).is_none());
    }

    #[test]
    fn query_kind_must_match_mode() {
        let clips = ViewMode::Clips.default_query(["a"], 10).unwrap();
        let snapshots = ViewMode::Snapshots.default_query(["a"], 10).unwrap();
        let recordings = ViewMode::Recordings.default_query(["a"], 10).unwrap();

        assert!(ViewMode::Clip.accepts(&clips));
        assert!(!ViewMode::Clip.accepts(&snapshots));
        assert!(ViewMode::Snapshot.accepts(&snapshots));
        assert!(ViewMode::Recording.accepts(&recordings));
        assert!(!ViewMode::Recordings.accepts(&clips));
        assert!(ViewMode::Timeline.accepts(&clips));
        assert!(ViewMode::Timeline.accepts(&recordings));
    }

    #[test]
    fn mode_categories() {
        assert!(ViewMode::Clips.is_gallery());
        assert!(ViewMode::Snapshot.is_viewer());
        assert!(ViewMode::Timeline.supports_multiple_cameras());
        assert!(!ViewMode::Live.is_media());
        assert_eq!(serde_yaml_ng::from_str::<ViewMode>("recordings").unwrap(), ViewMode::Recordings);
    }
}
