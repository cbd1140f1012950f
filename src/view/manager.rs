//! Single writer of the current view

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{MediaQueriesResults, View, ViewCamera, ViewContext, ViewParameters};
use crate::config::ViewConfig;
use crate::manager::{CameraManager, QueryOutcome};
use crate::types::MediaQuery;
use crate::{DeckError, Result};

/// Handle for a query whose results are still being fetched.
///
/// Results may only be applied through [`ViewManager::complete_query`], which
/// rejects them unless this is still the latest ticket and the view still
/// shows the query it was issued for.
#[derive(Debug)]
pub struct QueryTicket {
    query: MediaQuery,
    generation: u64,
    cancel: CancellationToken,
}

impl QueryTicket {
    pub fn query(&self) -> &MediaQuery {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fires when a newer query supersedes this one.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Owns the current [`View`] and publishes every change to subscribers.
///
/// Transitions are validated against the camera store before they are
/// published; a rejected transition leaves the current view in place.
pub struct ViewManager {
    cameras: Arc<CameraManager>,
    config: ViewConfig,
    view_tx: watch::Sender<Option<Arc<View>>>,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl ViewManager {
    pub fn new(cameras: Arc<CameraManager>, config: ViewConfig) -> Self {
        let (view_tx, _) = watch::channel(None);
        Self { cameras, config, view_tx, generation: 0, in_flight: None }
    }

    pub fn cameras(&self) -> &Arc<CameraManager> {
        &self.cameras
    }

    /// Current view, if one has been set.
    pub fn view(&self) -> Option<Arc<View>> {
        self.view_tx.borrow().clone()
    }

    pub fn has_view(&self) -> bool {
        self.view_tx.borrow().is_some()
    }

    /// Receiver observing every published view.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<View>>> {
        self.view_tx.subscribe()
    }

    /// Stream of views, starting with the current one if set.
    pub fn view_updates(&self) -> impl Stream<Item = Arc<View>> + 'static {
        WatchStream::new(self.view_tx.subscribe()).filter_map(|view| async move { view })
    }

    /// Replace the current view.
    ///
    /// A view without a query keeps the current query and results when they
    /// still belong to its mode and camera, and a view without context keeps
    /// the current context (see [`ViewManager::clear_context`]). Anything else
    /// is dropped.
    pub fn set_view(&mut self, view: View) -> Result<()> {
        self.check_camera(view.camera())?;
        let next = self.carry_forward(view)?;
        self.publish(next);
        Ok(())
    }

    /// Merge `context` into the current view, leaving query and results alone.
    pub fn set_view_with_new_context(&mut self, context: ViewContext) -> Result<()> {
        let current = self.view().ok_or_else(|| DeckError::invalid_view("no current view"))?;
        self.publish(current.with_merged_context(context));
        Ok(())
    }

    /// Drop every context key from the current view. Context is otherwise
    /// carried into each new view that has none of its own.
    pub fn clear_context(&mut self) -> Result<()> {
        let current = self.view().ok_or_else(|| DeckError::invalid_view("no current view"))?;
        self.publish(current.without_context());
        Ok(())
    }

    /// Switch to the configured default view and load its default query.
    ///
    /// Falls back to the first camera in store order when the configured
    /// camera is not registered. A query that fails or is superseded is
    /// logged and leaves the view without results.
    pub async fn set_view_default_with_new_query(&mut self) -> Result<()> {
        let camera_id = self.default_camera_id()?;
        let mode = self.config.default;
        let camera = ViewCamera::Single(camera_id.clone());

        let Some(query) = mode.default_query([camera_id], self.config.media_limit) else {
            let view = View::simple(mode, camera)?;
            self.supersede_in_flight();
            self.publish(view);
            return Ok(());
        };

        let ticket = self.begin_query(ViewParameters::new(mode, camera).with_query(query))?;
        let cameras = Arc::clone(&self.cameras);
        let outcome = match cameras.execute_query_cancellable(ticket.query(), ticket.cancel_token()).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, generation = ticket.generation, "Default query did not complete");
                return Ok(());
            }
        };
        for failure in &outcome.failures {
            warn!(camera = %failure.camera_id, error = %failure.error, "Default query partially failed");
        }
        self.complete_query(ticket, outcome);
        Ok(())
    }

    /// Publish a view carrying a new query and hand out the ticket for its
    /// results. Any query still in flight is cancelled.
    pub fn begin_query(&mut self, params: ViewParameters) -> Result<QueryTicket> {
        let Some(query) = params.query.clone() else {
            return Err(DeckError::invalid_view("a query view needs a query"));
        };
        let view = View::new(ViewParameters { results: None, ..params })?;
        self.check_camera(view.camera())?;

        self.supersede_in_flight();
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        self.publish(view);

        debug!(generation = self.generation, "Query started");
        Ok(QueryTicket { query, generation: self.generation, cancel })
    }

    /// Apply the results of `ticket`. Returns `false` and discards them when
    /// the ticket has been superseded or the view moved on to another query.
    pub fn complete_query(&mut self, ticket: QueryTicket, outcome: QueryOutcome) -> bool {
        let current = self.view();
        let current_query = current.as_ref().and_then(|view| view.query());
        if ticket.generation != self.generation
            || ticket.is_cancelled()
            || outcome.query != ticket.query
            || current_query != Some(&ticket.query)
        {
            debug!(
                ticket = ticket.generation,
                latest = self.generation,
                "Discarding stale query results"
            );
            return false;
        }
        let Some(current) = current else {
            return false;
        };

        self.in_flight = None;
        let results = outcome.results.with_wrap(self.config.wrap_navigation);
        debug!(generation = ticket.generation, count = results.len(), "Query results applied");
        self.publish(current.with_results(results));
        true
    }

    /// Select the media at `index` (clamped). Returns whether there were
    /// results to select from.
    pub fn select_media(&mut self, index: usize) -> bool {
        self.update_results(|results| {
            results.select(index);
            true
        })
    }

    /// Move the selection forward. Returns whether it moved.
    pub fn select_next(&mut self) -> bool {
        self.update_results(MediaQueriesResults::next)
    }

    /// Move the selection backward. Returns whether it moved.
    pub fn select_previous(&mut self) -> bool {
        self.update_results(MediaQueriesResults::previous)
    }

    fn update_results<F>(&mut self, update: F) -> bool
    where
        F: FnOnce(&mut MediaQueriesResults) -> bool,
    {
        let Some(current) = self.view() else {
            return false;
        };
        let Some(mut results) = current.results().cloned() else {
            return false;
        };
        if results.is_empty() || !update(&mut results) {
            return false;
        }
        self.publish(current.with_results(results));
        true
    }

    fn default_camera_id(&self) -> Result<String> {
        let store = self.cameras.store();
        if let Some(configured) = &self.config.camera {
            if store.has_camera(configured) {
                return Ok(configured.clone());
            }
            warn!(camera = %configured, "Default camera is not registered, using first camera");
        }
        store
            .first_camera()
            .map(|camera| camera.id().to_string())
            .ok_or_else(|| DeckError::invalid_config("no cameras available for the default view"))
    }

    fn check_camera(&self, camera: &ViewCamera) -> Result<()> {
        match camera {
            ViewCamera::Single(id) if !self.cameras.store().has_camera(id) => {
                warn!(camera = %id, "Rejected view for unknown camera");
                Err(DeckError::unknown_camera(id))
            }
            _ => Ok(()),
        }
    }

    fn carry_forward(&mut self, view: View) -> Result<View> {
        let Some(current) = self.view() else {
            return Ok(view);
        };

        let mut params = view.to_parameters();
        if params.context.is_empty() {
            params.context = current.context().clone();
        }
        if params.query.is_none()
            && view.mode().is_media()
            && current.query_belongs_to(view.mode(), view.camera())
        {
            params.query = current.query().cloned();
            params.results = current.results().cloned();
        }

        let next = View::new(params)?;
        if next.query() != current.query() {
            self.supersede_in_flight();
        }
        Ok(next)
    }

    fn supersede_in_flight(&mut self) {
        if let Some(cancel) = self.in_flight.take() {
            cancel.cancel();
        }
        self.generation += 1;
    }

    fn publish(&mut self, view: View) {
        let unchanged = self.view_tx.borrow().as_deref() == Some(&view);
        if unchanged {
            return;
        }
        info!(mode = %view.mode(), camera = %view.camera(), has_query = view.query().is_some(), "View changed");
        self.view_tx.send_replace(Some(Arc::new(view)));
    }
}

impl std::fmt::Debug for ViewManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewManager")
            .field("view", &self.view())
            .field("generation", &self.generation)
            .field("query_in_flight", &self.in_flight.is_some())
            .finish()
    }
}
