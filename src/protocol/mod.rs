//! Message types for the dispatch core
//!
//! Tasks, results, agent descriptions and the structured records produced while
//! processing. These are the only contracts a transport layer needs to bind to.

pub mod messages;

pub use messages::*;
