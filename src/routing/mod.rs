//! Task routing
//!
//! Maps a task type onto the component that handles it. See
//! [`classifier::determine_handler`].

pub mod classifier;

pub use classifier::{determine_handler, HandlerKind, ORCHESTRATOR_TASK_TYPES};
