#![deny(missing_docs)]
//! Orchestration layer (C7, §4.7) for the weave agentic execution core.
//!
//! Every orchestrator here is a thin driver over `weave_turn::TurnLoop` runs
//! — none of them reimplement turn-loop mechanics. [`Router`] classifies
//! then dispatches to one agent; [`Parallel`] fans a request out to several
//! agents at once; [`Hierarchical`] wires agents together as callable tools
//! via [`SubAgentTool`] so an executive can delegate through managers to
//! workers; [`Network`] has a group of peers discuss or broadcast a topic;
//! [`HandoffRunner`] resolves the `target_agent` name an `AgentResult::Handoff`
//! carries against a [`HandoffRegistry`] and keeps driving turn loops until
//! the chain ends in a non-handoff result. Grounded on the teacher's
//! `neuron-orch-local`/`neuron-orch-kit` dispatch and wiring patterns, and
//! `agent-runtime::SubAgentManager`'s nested-loop spawning, adapted
//! throughout to this workspace's `Agent`/`TurnLoop`/`ToolDyn` shapes.

mod handoff;
mod hierarchical;
mod network;
mod parallel;
mod router;
mod subagent_tool;

pub use handoff::{HandoffOutcome, HandoffRegistry, HandoffRunner};
pub use hierarchical::{Hierarchical, HierarchicalBuilder};
pub use network::{Contribution, Network, NetworkBuilder, NetworkResult, NetworkStreamHandlers};
pub use parallel::{Parallel, ParallelBuilder, ParallelResult, ParallelStreamHandlers};
pub use router::{Router, RouterBuilder, RouterStreamHandlers};
pub use subagent_tool::SubAgentTool;
