//! The immutable description of what is displayed

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{MediaQueriesResults, ViewMode};
use crate::types::{MediaQuery, ViewMedia};
use crate::{DeckError, Result};

/// Opaque key/value context carried between views (scroll offsets, the
/// selected timeline window, ...).
pub type ViewContext = BTreeMap<String, serde_json::Value>;

/// Camera a view is focused on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewCamera {
    /// Every camera, for galleries and the timeline.
    All,
    Single(String),
}

impl ViewCamera {
    pub fn single(camera_id: impl Into<String>) -> Self {
        ViewCamera::Single(camera_id.into())
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ViewCamera::All => None,
            ViewCamera::Single(id) => Some(id),
        }
    }
}

impl fmt::Display for ViewCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewCamera::All => f.write_str("<all>"),
            ViewCamera::Single(id) => f.write_str(id),
        }
    }
}

/// Inputs for [`View::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParameters {
    pub mode: ViewMode,
    pub camera: ViewCamera,
    pub query: Option<MediaQuery>,
    pub results: Option<MediaQueriesResults>,
    pub context: ViewContext,
}

impl ViewParameters {
    pub fn new(mode: ViewMode, camera: ViewCamera) -> Self {
        Self { mode, camera, query: None, results: None, context: ViewContext::new() }
    }

    pub fn with_query(mut self, query: MediaQuery) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_results(mut self, results: MediaQueriesResults) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_context(mut self, context: ViewContext) -> Self {
        self.context = context;
        self
    }
}

/// An immutable view.
///
/// Construction enforces that the mode and the presence of a query and results
/// agree: `live` and `image` never carry a query, results always come with the
/// query that produced them, and the query kind fits the mode.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    mode: ViewMode,
    camera: ViewCamera,
    query: Option<MediaQuery>,
    results: Option<MediaQueriesResults>,
    context: ViewContext,
}

impl View {
    pub fn new(params: ViewParameters) -> Result<Self> {
        let ViewParameters { mode, camera, query, results, context } = params;
        if let Some(query) = &query {
            if !mode.accepts(query) {
                return Err(DeckError::invalid_view(format!(
                    "{} view cannot carry a {} query",
                    mode,
                    if query.is_events() { "events" } else { "recordings" }
                )));
            }
        }
        if results.is_some() && query.is_none() {
            return Err(DeckError::invalid_view("results require the query that produced them"));
        }
        if camera == ViewCamera::All && !mode.supports_multiple_cameras() {
            return Err(DeckError::invalid_view(format!("{mode} view needs a single camera")));
        }
        Ok(Self { mode, camera, query, results, context })
    }

    /// A view with no query or context.
    pub fn simple(mode: ViewMode, camera: ViewCamera) -> Result<Self> {
        Self::new(ViewParameters::new(mode, camera))
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn query(&self) -> Option<&MediaQuery> {
        self.query.as_ref()
    }

    pub fn results(&self) -> Option<&MediaQueriesResults> {
        self.results.as_ref()
    }

    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    /// Currently selected media, if any.
    pub fn selected_media(&self) -> Option<&ViewMedia> {
        self.results.as_ref().and_then(MediaQueriesResults::selected)
    }

    pub fn is_gallery_view(&self) -> bool {
        self.mode.is_gallery()
    }

    pub fn is_viewer_view(&self) -> bool {
        self.mode.is_viewer()
    }

    pub fn supports_multiple_cameras(&self) -> bool {
        self.mode.supports_multiple_cameras()
    }

    /// Whether the query and results still belong to `(mode, camera)`.
    pub fn query_belongs_to(&self, mode: ViewMode, camera: &ViewCamera) -> bool {
        match &self.query {
            Some(query) => {
                let covered = match camera {
                    // Only a query issued for every camera can back an all-cameras view.
                    ViewCamera::All => self.camera == ViewCamera::All,
                    ViewCamera::Single(id) => query.targets(id),
                };
                mode.accepts(query) && covered
            }
            None => true,
        }
    }

    /// Decompose into parameters for building a successor view.
    pub fn to_parameters(&self) -> ViewParameters {
        ViewParameters {
            mode: self.mode,
            camera: self.camera.clone(),
            query: self.query.clone(),
            results: self.results.clone(),
            context: self.context.clone(),
        }
    }

    /// Copy with `context` merged over the existing keys.
    pub fn with_merged_context(&self, context: ViewContext) -> View {
        let mut merged = self.clone();
        merged.context.extend(context);
        merged
    }

    /// Copy with an empty context.
    pub(crate) fn without_context(&self) -> View {
        let mut next = self.clone();
        next.context.clear();
        next
    }

    /// Copy with new results for the same query.
    pub(crate) fn with_results(&self, results: MediaQueriesResults) -> View {
        let mut next = self.clone();
        next.results = Some(results);
        next
    }
}
