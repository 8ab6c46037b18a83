//! # weave-core — data model for the agentic execution core
//!
//! This crate owns the leaf data types every other `weave-*` crate shares:
//! the mutable per-conversation [`Context`] (C1), the tool-execution and
//! guardrail-outcome records the Tool Registry and Guardrail Gate produce,
//! the `Memory` entry shape, typed ids, and the §7 error taxonomy.
//!
//! It intentionally holds no behavior beyond what these records need —
//! `TurnLoop`, `Agent`, `AgentRunState`, and `AgentResult` live in
//! `weave-turn`, which is where the state machine that actually produces
//! and consumes them runs.

#![deny(missing_docs)]

pub mod context;
pub mod error;
pub mod guardrail;
pub mod history;
pub mod id;
pub mod memory;
pub mod tool;

pub use context::{Context, TraceContext};
pub use error::WeaveError;
pub use guardrail::GuardrailResult;
pub use history::HistoryItem;
pub use id::{AgentId, CallId, SessionId};
pub use memory::MemoryEntry;
pub use tool::{ToolExecution, ToolOutput, ToolStatus};
