//! Engine error taxonomy.
//!
//! Nothing here is fatal to the host application: invalid samples are
//! rejected one at a time, rate-limited calls are distinguishable from hard
//! failures so batch paths can skip them, and collaborator failures degrade
//! to last-known-good state or a static fallback reply.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A single sensor sample was malformed. The ongoing fused state is
    /// unaffected; only this sample is rejected.
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// The per-sample analysis entry point was called inside its cooldown
    /// window. Not a hard error; callers iterating a batch should skip it.
    #[error("analysis rate limited")]
    RateLimited,

    /// The completion provider failed (transport, quota, malformed reply).
    /// The orchestrator substitutes a static fallback response.
    #[error("completion provider error: {0}")]
    Provider(String),

    /// A document-store operation failed. Persistence is best-effort; the
    /// in-memory state stays authoritative for the rest of the session.
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// True for the debounce rejection, so batch analysis can special-case
    /// it without string matching.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, EngineError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_distinguishable() {
        assert!(EngineError::RateLimited.is_rate_limited());
        assert!(!EngineError::Provider("quota".to_string()).is_rate_limited());
        assert!(!EngineError::InvalidSample("empty".to_string()).is_rate_limited());
    }
}
