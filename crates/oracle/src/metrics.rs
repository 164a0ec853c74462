//! Authorization metrics.

use metrics::{Counter, counter};

use crate::CallVerdict;

/// Counters for authorization checks and pending-store lookups.
#[derive(Clone, Debug)]
pub struct OracleMetrics {
    /// `isValidSignature` returned the magic value
    pub accepted: Counter,

    /// `isValidSignature` returned something else
    pub rejected: Counter,

    /// `isValidSignature` reverted with the magic value in the revert data
    pub accepted_in_revert: Counter,

    /// `isValidSignature` reverted
    pub call_failed: Counter,

    /// Pending-store queries
    pub pending_lookups: Counter,

    /// Pending-store queries that found a matching transaction
    pub pending_matches: Counter,
}

impl Default for OracleMetrics {
    fn default() -> Self {
        let check = |outcome: &'static str| counter!("safe_oracle_authorization_checks", "outcome" => outcome);
        Self {
            accepted: check("accepted"),
            rejected: check("rejected"),
            accepted_in_revert: check("accepted_in_revert"),
            call_failed: check("call_failed"),
            pending_lookups: counter!("safe_oracle_pending_lookups"),
            pending_matches: counter!("safe_oracle_pending_matches"),
        }
    }
}

impl OracleMetrics {
    /// Record the verdict of an `isValidSignature` call
    #[inline]
    pub fn record_verdict(&self, verdict: CallVerdict) {
        match verdict {
            CallVerdict::Accepted => self.accepted.increment(1),
            CallVerdict::ReturnedOther => self.rejected.increment(1),
            CallVerdict::RevertedWithMagic => self.accepted_in_revert.increment(1),
            CallVerdict::Reverted => self.call_failed.increment(1),
        }
    }

    /// Record a pending-store query and whether it matched
    #[inline]
    pub fn record_pending_lookup(&self, matched: bool) {
        self.pending_lookups.increment(1);
        if matched {
            self.pending_matches.increment(1);
        }
    }
}
