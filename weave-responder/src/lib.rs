//! Transport boundary for the weave agentic execution core.
//!
//! This crate defines the logical shape of a request/response exchange with
//! an LLM backend (§6.1) and the two-trait `Responder`/`DynResponder` split
//! that lets heterogeneous responders live behind one `Arc<dyn DynResponder>`
//! in `weave-turn`, plus the ambient `RetryPolicy` (§6.3) transport retries
//! are built around.

#![deny(missing_docs)]

pub mod responder;
pub mod retry;
pub mod types;

pub use responder::{DynResponder, Responder, ResponderError, ResponderStream};
pub use retry::{Backoff, RetryPolicy};
pub use types::{
    OutputItem, ProviderRequest, ProviderResponse, StreamEvent, TokenUsage, ToolSchema,
};
