//! `AgentRunState` (C6, §3, §4.6) — the serializable pause token, and
//! `ApprovalDecision` (§4.4 resume semantics).
//!
//! Modeled as a plain enum with data carried per-variant, not a generic
//! "status + optional fields" struct, so illegal states (an `approvalResult`
//! set while `status == Running`) are unrepresentable — the teacher has no
//! equivalent; this is new relative to it, built directly against §3/§4.4/
//! §4.6.

use weave_core::{CallId, Context, ToolExecution, WeaveError};
use weave_responder::ProviderResponse;

/// A function-call the model made that is awaiting a human approval
/// decision before the turn loop will execute it (§4.4 step 7a).
#[derive(Debug, Clone)]
pub struct PendingToolCall {
    /// The model-originated call id.
    pub call_id: CallId,
    /// Name of the gated tool.
    pub tool_name: String,
    /// Raw JSON arguments as the model supplied them.
    pub arguments_json: serde_json::Value,
}

/// The resolution of a pending tool-call approval (§4.4 Resume semantics).
#[derive(Debug, Clone)]
pub enum ApprovalDecision {
    /// The human approved the call; `output` is substituted for whatever
    /// the tool handler would otherwise have produced — the handler is
    /// never invoked.
    Approved(String),
    /// The human rejected the call, with an optional reason. Absent reason
    /// becomes the default message "user denied".
    Rejected(Option<String>),
}

/// The pause token a suspended turn loop hands back to its caller (§3, §4.6).
///
/// Status-specific data lives in each variant. Read-only accessors are
/// available on every variant; the `approve_tool_call`/`reject_tool_call`
/// mutators only succeed on `PendingToolApproval` and only before an
/// approval decision has already been recorded (§8 invariant: "at most one
/// of approve/reject... is honored").
#[derive(Debug, Clone)]
pub enum AgentRunState {
    /// The loop is between turns (transient; not normally observed
    /// externally — only `PendingToolApproval` is ever handed back as a
    /// pause token from `TurnLoop::run`).
    Running {
        /// The owning agent's name.
        agent_name: String,
        /// The live context this run is operating on.
        context: Context,
        /// Turns consumed so far.
        current_turn: u32,
        /// Tool executions recorded so far.
        tool_executions: Vec<ToolExecution>,
        /// The most recent responder reply, if any.
        last_response: Option<ProviderResponse>,
    },
    /// Suspended awaiting a human approval decision on `pending_tool_call`.
    PendingToolApproval {
        /// The owning agent's name.
        agent_name: String,
        /// The live context this run is operating on.
        context: Context,
        /// Turns consumed so far.
        current_turn: u32,
        /// Tool executions recorded so far.
        tool_executions: Vec<ToolExecution>,
        /// The most recent responder reply, if any.
        last_response: Option<ProviderResponse>,
        /// The call awaiting approval.
        pending_tool_call: PendingToolCall,
        /// Set at most once, by `approve_tool_call`/`reject_tool_call`.
        approval_result: Option<ApprovalDecision>,
    },
    /// Terminal: the run finished successfully.
    Completed {
        /// The owning agent's name.
        agent_name: String,
        /// The live context this run is operating on.
        context: Context,
        /// Turns consumed so far.
        current_turn: u32,
        /// Tool executions recorded so far.
        tool_executions: Vec<ToolExecution>,
        /// The most recent responder reply, if any.
        last_response: Option<ProviderResponse>,
    },
    /// Terminal: the run failed.
    Failed {
        /// The owning agent's name.
        agent_name: String,
        /// The live context this run is operating on.
        context: Context,
        /// Turns consumed so far.
        current_turn: u32,
        /// Tool executions recorded so far.
        tool_executions: Vec<ToolExecution>,
        /// The most recent responder reply, if any.
        last_response: Option<ProviderResponse>,
    },
}

impl AgentRunState {
    /// Whether this state is COMPLETED or FAILED.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentRunState::Completed { .. } | AgentRunState::Failed { .. })
    }

    /// The owning agent's name.
    pub fn agent_name(&self) -> &str {
        match self {
            AgentRunState::Running { agent_name, .. }
            | AgentRunState::PendingToolApproval { agent_name, .. }
            | AgentRunState::Completed { agent_name, .. }
            | AgentRunState::Failed { agent_name, .. } => agent_name,
        }
    }

    /// Read-only view of the live context.
    pub fn context(&self) -> &Context {
        match self {
            AgentRunState::Running { context, .. }
            | AgentRunState::PendingToolApproval { context, .. }
            | AgentRunState::Completed { context, .. }
            | AgentRunState::Failed { context, .. } => context,
        }
    }

    /// Turns consumed so far.
    pub fn current_turn(&self) -> u32 {
        match self {
            AgentRunState::Running { current_turn, .. }
            | AgentRunState::PendingToolApproval { current_turn, .. }
            | AgentRunState::Completed { current_turn, .. }
            | AgentRunState::Failed { current_turn, .. } => *current_turn,
        }
    }

    /// Tool executions recorded so far.
    pub fn tool_executions(&self) -> &[ToolExecution] {
        match self {
            AgentRunState::Running { tool_executions, .. }
            | AgentRunState::PendingToolApproval { tool_executions, .. }
            | AgentRunState::Completed { tool_executions, .. }
            | AgentRunState::Failed { tool_executions, .. } => tool_executions,
        }
    }

    /// The most recent responder reply, if any.
    pub fn last_response(&self) -> Option<&ProviderResponse> {
        match self {
            AgentRunState::Running { last_response, .. }
            | AgentRunState::PendingToolApproval { last_response, .. }
            | AgentRunState::Completed { last_response, .. }
            | AgentRunState::Failed { last_response, .. } => last_response.as_ref(),
        }
    }

    /// The call awaiting approval, if this state is `PendingToolApproval`.
    pub fn pending_tool_call(&self) -> Option<&PendingToolCall> {
        match self {
            AgentRunState::PendingToolApproval {
                pending_tool_call, ..
            } => Some(pending_tool_call),
            _ => None,
        }
    }

    /// Approve the pending call, substituting `output` for the handler's
    /// result. Fails if this state isn't `PendingToolApproval`, or if a
    /// decision was already recorded.
    pub fn approve_tool_call(&mut self, output: impl Into<String>) -> Result<(), WeaveError> {
        self.set_approval(ApprovalDecision::Approved(output.into()))
    }

    /// Reject the pending call with an optional reason. Fails if this state
    /// isn't `PendingToolApproval`, or if a decision was already recorded.
    pub fn reject_tool_call(&mut self, reason: Option<String>) -> Result<(), WeaveError> {
        self.set_approval(ApprovalDecision::Rejected(reason))
    }

    fn set_approval(&mut self, decision: ApprovalDecision) -> Result<(), WeaveError> {
        match self {
            AgentRunState::PendingToolApproval { approval_result, .. } => {
                if approval_result.is_some() {
                    return Err(WeaveError::ResumeContract(
                        "an approval decision was already recorded for this call".into(),
                    ));
                }
                *approval_result = Some(decision);
                Ok(())
            }
            _ => Err(WeaveError::ResumeContract(
                "only a state pending tool approval accepts an approval decision".into(),
            )),
        }
    }
}
