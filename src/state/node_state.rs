/// Node state definitions for tracking traversal progress
///
/// Every crawl target moves through
/// `Pending -> Fetching -> {Scored, FetchFailed} -> Expanded (if Scored)`.
use std::fmt;

/// Represents the current state of one URL in the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    // ===== Active States =====
    /// URL is enqueued but has not been claimed in the visited set
    Pending,

    /// URL has been claimed and handed to the fetcher
    Fetching,

    // ===== Terminal States =====
    /// Fetch succeeded; scorer and classifier have run
    Scored,

    /// Fetch returned an error or an empty body; no expansion
    FetchFailed,

    /// Outbound links became the next level's candidates
    Expanded,
}

impl NodeState {
    /// Returns true if no further transition can follow
    ///
    /// `Scored` is not terminal: a scored page at the depth bound simply
    /// stays there, but a scored page below it moves on to `Expanded`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::Expanded)
    }

    /// Returns true if the fetch for this node succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Scored | Self::Expanded)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Scored)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Scored, Self::Expanded)
        )
    }

    /// Moves to `next`, logging and refusing illegal transitions
    pub fn advance(&mut self, next: NodeState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            tracing::error!("Invalid node state transition: {} -> {}", self, next);
            false
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Scored => "scored",
            Self::FetchFailed => "fetch_failed",
            Self::Expanded => "expanded",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
