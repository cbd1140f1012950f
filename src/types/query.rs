//! Query value objects issued against camera engines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::MediaKind;

/// Optional, possibly open-ended time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whether a media interval overlaps this window. Open bounds match everything.
    pub fn overlaps(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
        let after_start = match (self.start, end.or(start)) {
            (Some(window_start), Some(media_end)) => media_end >= window_start,
            _ => true,
        };
        let before_end = match (self.end, start) {
            (Some(window_end), Some(media_start)) => media_start <= window_end,
            _ => true,
        };
        after_start && before_end
    }
}

/// Query for backend events (clips and snapshots).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventQuery {
    pub cameras: BTreeSet<String>,
    #[serde(default)]
    pub time: TimeRange,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub zones: BTreeSet<String>,
    pub favorite: Option<bool>,
    pub has_clip: Option<bool>,
    pub has_snapshot: Option<bool>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn for_cameras<I, S>(cameras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { cameras: cameras.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// The kind of media this query produces.
    pub fn media_kind(&self) -> MediaKind {
        if self.has_clip == Some(true) || self.has_snapshot != Some(true) {
            MediaKind::Clip
        } else {
            MediaKind::Snapshot
        }
    }
}

/// Query for continuous recording segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingQuery {
    pub cameras: BTreeSet<String>,
    #[serde(default)]
    pub time: TimeRange,
    pub limit: Option<usize>,
}

impl RecordingQuery {
    pub fn for_cameras<I, S>(cameras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { cameras: cameras.into_iter().map(Into::into).collect(), ..Default::default() }
    }
}

/// Any query the camera manager can execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaQuery {
    Events(EventQuery),
    Recordings(RecordingQuery),
}

impl MediaQuery {
    /// Target camera ids.
    pub fn cameras(&self) -> &BTreeSet<String> {
        match self {
            MediaQuery::Events(query) => &query.cameras,
            MediaQuery::Recordings(query) => &query.cameras,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            MediaQuery::Events(query) => query.limit,
            MediaQuery::Recordings(query) => query.limit,
        }
    }

    pub fn time(&self) -> TimeRange {
        match self {
            MediaQuery::Events(query) => query.time,
            MediaQuery::Recordings(query) => query.time,
        }
    }

    /// Whether this query fetches data for `camera_id`.
    pub fn targets(&self, camera_id: &str) -> bool {
        self.cameras().contains(camera_id)
    }

    pub fn is_events(&self) -> bool {
        matches!(self, MediaQuery::Events(_))
    }

    pub fn is_recordings(&self) -> bool {
        matches!(self, MediaQuery::Recordings(_))
    }
}

impl From<EventQuery> for MediaQuery {
    fn from(query: EventQuery) -> Self {
        MediaQuery::Events(query)
    }
}

impl From<RecordingQuery> for MediaQuery {
    fn from(query: RecordingQuery) -> Self {
        MediaQuery::Recordings(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn queries_are_equal_iff_all_fields_equal() {
        let a = EventQuery { has_clip: Some(true), ..EventQuery::for_cameras(["a", "b"]) };
        let b = EventQuery { has_clip: Some(true), ..EventQuery::for_cameras(["b", "a"]) };
        let c = EventQuery { has_clip: Some(true), limit: Some(5), ..EventQuery::for_cameras(["a", "b"]) };

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<MediaQuery> = [a.into(), b.into(), c.into()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn event_query_media_kind_follows_filters() {
        let clips = EventQuery { has_clip: Some(true), ..Default::default() };
        let snapshots = EventQuery { has_snapshot: Some(true), ..Default::default() };
        assert_eq!(clips.media_kind(), MediaKind::Clip);
        assert_eq!(snapshots.media_kind(), MediaKind::Snapshot);
        assert_eq!(EventQuery::default().media_kind(), MediaKind::Clip);
    }

    #[test]
    fn time_range_overlap_handles_open_bounds() {
        let window = TimeRange::new(Some(at(10)), Some(at(20)));
        assert!(window.overlaps(Some(at(5)), Some(at(12))));
        assert!(window.overlaps(Some(at(15)), None));
        assert!(!window.overlaps(Some(at(21)), Some(at(30))));
        assert!(!window.overlaps(Some(at(1)), Some(at(9))));
        assert!(TimeRange::default().overlaps(None, None));
    }

    #[test]
    fn media_query_serde_is_tagged() {
        let query: MediaQuery = RecordingQuery::for_cameras(["front"]).into();
        let yaml = serde_yaml_ng::to_string(&query).unwrap();
        assert!(yaml.contains("type: recordings"));
        let back: MediaQuery = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, query);
    }
}
