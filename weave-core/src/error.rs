//! Error taxonomy for the turn loop and its collaborators (§7).

use thiserror::Error;

/// Terminal errors a turn loop (or resume entry point) can raise.
///
/// Tool errors are deliberately absent here — §7 category 4 says a tool
/// error is *recovered locally* as an error-status [`crate::tool::ToolOutput`]
/// appended to history, never surfaced as a `WeaveError`. Handoff "failure"
/// (§7 category 8) is likewise not a variant: a handoff that leads to a
/// failing target agent is an ordinary `AgentResult::Handoff` plus whatever
/// error the target's own run produced, not a distinct error shape —
/// `weave_orch::HandoffRunner` is what resolves a handoff's target name and
/// surfaces that combined outcome.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Invalid builder input: null/empty required field, non-positive
    /// `max_turns`, temperature out of `[0, 2]`, `max_output_tokens <= 0`,
    /// duplicate tool name, or a handoff tool name colliding with a regular
    /// tool. Raised eagerly at `build()`, never inside the loop.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An input or output guardrail returned `Failed(reason)`.
    #[error("guardrail failed: {0}")]
    Guardrail(String),

    /// The LLM transport failed after the retry policy was exhausted.
    #[error("transport error: {0}")]
    Transport(String),

    /// A structured agent's model output did not parse as `outputType`.
    #[error("parse error: {0}")]
    Parse(String),

    /// `turn >= max_turns` before the loop could produce a terminal result.
    #[error("max turns exceeded ({max_turns})")]
    MaxTurnsExceeded {
        /// The configured turn limit that was hit.
        max_turns: u32,
    },

    /// Attempted to resume a state that is not `PendingToolApproval`, or a
    /// `PendingToolApproval` state with no `approval_result` set yet.
    #[error("resume contract violation: {0}")]
    ResumeContract(String),

    /// Catch-all for errors that don't fit the taxonomy above.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
