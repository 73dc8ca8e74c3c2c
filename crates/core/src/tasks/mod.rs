//! Task list state, its transitions, and the store that drives them.

mod action;
mod state;
mod store;

pub use action::TasksAction;
pub use state::{reduce, TasksState, TOGGLE_ROLLBACK_MESSAGE};
pub use store::{DeleteOutcome, TaskStore};
