//! Per-tick outcomes reported by scanners

use crate::gate::GateDecision;

/// What a single scanner tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The scanner is misconfigured and never scans
    Disabled,
    /// The gate refused the tick; nothing was queried, smoothed or published
    Skipped(GateDecision),
    /// Active, but the next scan is not due yet
    Waiting,
    /// A scan completed
    Scanned { queries: usize },
    /// The geometry backend failed; the previous estimate was kept
    ProbeFailed,
}

impl TickOutcome {
    pub fn did_scan(&self) -> bool {
        matches!(self, Self::Scanned { .. })
    }

    /// Ray queries issued by a completed scan
    pub fn queries(&self) -> usize {
        match self {
            Self::Scanned { queries } => *queries,
            _ => 0,
        }
    }

    pub fn is_gated(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ProbeFailed)
    }
}
