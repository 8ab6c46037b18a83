#![deny(missing_docs)]
//! Streaming callback facade (C5, §4.5) for the weave agentic execution core.
//!
//! `StreamFacade` wraps one `weave_turn::TurnLoop` invocation with a fluent
//! callback registry and fans out per-turn events while the loop runs,
//! instead of only handing back a single terminal `AgentResult`. Grounded
//! on `layer0::Hook`'s observer design ("the turn doesn't know who's
//! watching" — hooks are registered externally and fired at defined
//! points) adapted to §4.5's fixed ten-callback contract and plain
//! closures rather than a registered trait object per hook point, per
//! §4.5's own Rust-shape guidance.

mod adapter;
mod facade;
mod handle;

pub use adapter::HandoffEvent;
pub use facade::StreamFacade;
pub use handle::StreamHandle;
