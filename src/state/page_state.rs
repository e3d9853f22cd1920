/// Page state definitions for tracking crawl progress
///
/// Every URL moves through `Discovered → Scheduled → Fetched` and ends in one
/// of the terminal states `Accepted`, `Rejected` or `Failed`.
use crate::url::ExclusionReason;
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// URL has been found but not yet admitted to the visited set
    Discovered,

    /// URL is admitted and waiting for (or undergoing) a fetch
    Scheduled,

    /// URL was fetched; classification pending
    Fetched,

    // ===== Terminal States =====
    /// Page contributes to the archive
    Accepted,

    /// Page was dropped by scope, exclusion, duplicate or budget rules
    Rejected,

    /// Page could not be fetched after exhausting retries
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Failed)
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Checks whether a transition to `next` is legal
    ///
    /// `Discovered` may jump straight to `Rejected` (scope, duplicate and
    /// budget checks happen before scheduling) and `Scheduled` may end in
    /// `Rejected` (robots.txt) or `Failed` (fetch errors).
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use PageState::*;
        matches!(
            (self, next),
            (Discovered, Scheduled)
                | (Discovered, Rejected)
                | (Scheduled, Fetched)
                | (Scheduled, Rejected)
                | (Scheduled, Failed)
                | (Fetched, Accepted)
                | (Fetched, Rejected)
                | (Fetched, Failed)
        )
    }

    /// Short lowercase label used in logs and the manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Scheduled => "scheduled",
            Self::Fetched => "fetched",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Scheduled,
            Self::Fetched,
            Self::Accepted,
            Self::Rejected,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a URL ended in [`PageState::Rejected`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// Host is outside the crawl's scope (checked again after redirects)
    OutOfScope,
    /// Matched an exclusion rule
    Excluded(ExclusionReason),
    /// Already in the visited set
    Duplicate,
    /// Deeper than the configured maximum depth
    DepthExceeded,
    /// Page budget already spent
    BudgetExhausted,
    /// Disallowed by the site's robots.txt
    RobotsDisallowed,
    /// No converter is registered for the response's content type
    UnsupportedContent,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfScope => f.write_str("out of scope"),
            Self::Excluded(reason) => write!(f, "excluded ({})", reason),
            Self::Duplicate => f.write_str("duplicate"),
            Self::DepthExceeded => f.write_str("depth exceeded"),
            Self::BudgetExhausted => f.write_str("page budget exhausted"),
            Self::RobotsDisallowed => f.write_str("disallowed by robots.txt"),
            Self::UnsupportedContent => f.write_str("unsupported content type"),
        }
    }
}
