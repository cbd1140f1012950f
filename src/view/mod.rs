//! View state: what the dashboard is showing and the results behind it.
//!
//! - [`View`]: immutable description of the current display
//! - [`MediaQueriesResults`]: merged, navigable query results
//! - [`ViewManager`]: the only place a new view is published from

mod manager;
mod media_results;
mod mode;
#[allow(clippy::module_inception)]
mod view;

pub use manager::{QueryTicket, ViewManager};
pub use media_results::MediaQueriesResults;
pub use mode::ViewMode;
pub use view::{View, ViewCamera, ViewContext, ViewParameters};
