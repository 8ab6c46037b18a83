#![deny(missing_docs)]
//! Turn Loop (C4, §4.4) for the weave agentic execution core.
//!
//! [`Agent`]/[`AgentBuilder`] is the immutable configuration record; [`TurnLoop`]
//! is the stateless driver that runs it to a terminal [`AgentResult`] or
//! suspends it as an [`AgentRunState`], resumable via [`TurnLoop::resume`].
//! Grounded on the teacher's `ReactConfig`/`ReactOperator` split, generalized
//! with pause/resume and handoff-as-loop-termination the teacher has neither.

mod agent;
mod handoff;
mod hooks;
mod result;
mod run_state;
mod telemetry;
mod turn_loop;

#[cfg(test)]
mod testutil;

pub use agent::{Agent, AgentBuilder, ContextManagementConfig};
pub use handoff::Handoff;
pub use hooks::{NoHooks, TurnHooks};
pub use result::{AgentResult, StructuredAgentResult};
pub use run_state::{AgentRunState, ApprovalDecision, PendingToolCall};
pub use telemetry::{TelemetryEvent, TelemetryProcessor};
pub use turn_loop::TurnLoop;
