//! State module for tracking traversal progress
//!
//! `NodeState` is the per-URL state machine the crawl engine walks each
//! target through. It is transient: nothing here outlives a crawl run.

mod node_state;

pub use node_state::NodeState;
