#![deny(missing_docs)]
//! # weave — umbrella crate
//!
//! Provides a single import surface for the weave agentic execution core.
//! Re-exports each `weave-*` crate behind a feature flag, plus a `prelude`
//! for the happy path.

#[cfg(feature = "core")]
pub use weave_context;
#[cfg(feature = "core")]
pub use weave_core;
#[cfg(feature = "core")]
pub use weave_guardrail;
#[cfg(feature = "memory")]
pub use weave_memory;
#[cfg(feature = "memory-fs")]
pub use weave_memory_fs;
#[cfg(feature = "memory-mem")]
pub use weave_memory_mem;
#[cfg(feature = "orch")]
pub use weave_orch;
#[cfg(feature = "core")]
pub use weave_responder;
#[cfg(feature = "stream")]
pub use weave_stream;
#[cfg(feature = "core")]
pub use weave_tool;
#[cfg(feature = "core")]
pub use weave_turn;

/// Happy-path imports for composing weave agents.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use weave_core::{
        AgentId, CallId, Context, GuardrailResult, HistoryItem, MemoryEntry, SessionId,
        ToolExecution, ToolOutput, ToolStatus, TraceContext, WeaveError,
    };

    #[cfg(feature = "core")]
    pub use weave_responder::{
        Backoff, DynResponder, OutputItem, ProviderRequest, ProviderResponse, Responder,
        ResponderError, ResponderStream, RetryPolicy, StreamEvent, TokenUsage, ToolSchema,
    };

    #[cfg(feature = "core")]
    pub use weave_tool::{ToolDyn, ToolError, ToolRegistry};

    #[cfg(feature = "core")]
    pub use weave_guardrail::{GuardrailGate, InputGuardrail, OutputGuardrail};

    #[cfg(feature = "core")]
    pub use weave_context::{
        ContextManagementStrategy, HeuristicTokenCounter, NoCompaction, SlidingWindow,
        TokenCounter,
    };

    #[cfg(feature = "core")]
    pub use weave_turn::{
        Agent, AgentBuilder, AgentResult, AgentRunState, ApprovalDecision, ContextManagementConfig,
        Handoff, NoHooks, PendingToolCall, StructuredAgentResult, TelemetryEvent,
        TelemetryProcessor, TurnHooks, TurnLoop,
    };

    #[cfg(feature = "stream")]
    pub use weave_stream::{HandoffEvent, StreamFacade, StreamHandle};

    #[cfg(feature = "orch")]
    pub use weave_orch::{
        Contribution, HandoffOutcome, HandoffRegistry, HandoffRunner, Hierarchical,
        HierarchicalBuilder, Network, NetworkBuilder, NetworkResult, NetworkStreamHandlers,
        Parallel, ParallelBuilder, ParallelResult, ParallelStreamHandlers, Router, RouterBuilder,
        RouterStreamHandlers, SubAgentTool,
    };

    #[cfg(feature = "memory")]
    pub use weave_memory::{Memory, MemoryError};

    #[cfg(feature = "memory-mem")]
    pub use weave_memory_mem::MemoryStore;

    #[cfg(feature = "memory-fs")]
    pub use weave_memory_fs::FsMemoryStore;
}
