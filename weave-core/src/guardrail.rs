//! Guardrail outcome type shared between the Guardrail Gate (C3, in
//! `weave-guardrail`) and the Turn Loop (C4).

use serde::{Deserialize, Serialize};

/// The outcome of running one guardrail predicate (§3).
///
/// `Passed` is a singleton; `Failed` always carries a non-empty reason —
/// constructing a `Failed` with an empty reason is rejected (§8 boundary
/// behavior: "Guardrail that passes with empty reason is rejected at
/// construction").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GuardrailResult {
    /// The guardrail raised no objection.
    Passed,
    /// The guardrail rejected the input/output.
    Failed {
        /// Non-empty human-readable reason.
        reason: String,
    },
}

impl GuardrailResult {
    /// Build a `Failed` result.
    ///
    /// # Panics
    /// Panics if `reason` is empty — constructing a guardrail failure with
    /// no reason is a programming error the spec requires to be rejected
    /// at construction, not silently accepted.
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        assert!(!reason.is_empty(), "guardrail failure reason must not be empty");
        GuardrailResult::Failed { reason }
    }

    /// Whether this result passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, GuardrailResult::Passed)
    }

    /// The failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            GuardrailResult::Passed => None,
            GuardrailResult::Failed { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_has_no_reason() {
        assert!(GuardrailResult::Passed.is_passed());
        assert_eq!(GuardrailResult::Passed.reason(), None);
    }

    #[test]
    fn failed_carries_reason() {
        let result = GuardrailResult::failed("contains forbidden term");
        assert!(!result.is_passed());
        assert_eq!(result.reason(), Some("contains forbidden term"));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn failed_with_empty_reason_panics() {
        GuardrailResult::failed("");
    }
}
