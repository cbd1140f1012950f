//! Declarative conditions and the epoch that tells consumers when their
//! results may have changed.

mod condition;
mod manager;
mod state;

pub use condition::{Condition, Dependencies};
pub use manager::{ConditionId, ConditionsManager};
pub use state::ConditionState;
