//! `SubAgentTool` (§4.7.5) — adapts an [`Agent`] as a callable tool another
//! agent can invoke, grounded on the teacher's `agent-runtime::SubAgentManager`
//! (nested-loop spawning with a filtered tool set and a depth guard), adapted
//! to this workspace's object-safe [`ToolDyn`] boundary instead of the
//! teacher's generic-over-`Provider`/`ContextStrategy` spawn method.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use weave_core::Context;
use weave_tool::{ToolDyn, ToolError};
use weave_turn::{Agent, AgentResult, TurnLoop};

/// Copies `caller_ctx`'s state/history into `sub_context` per the
/// `shareState`/`shareHistory` flags. Split out from [`SubAgentTool::call`]
/// so the merge logic is unit-testable without driving a full turn loop —
/// neither `Responder` nor `ToolDyn::call` ever observes `Context.state`
/// directly, so there is no other way to assert this behavior end-to-end.
fn merge_shared_context(sub_context: &mut Context, caller_ctx: &Context, share_state: bool, share_history: bool) {
    if share_state {
        for (key, value) in caller_ctx.state_entries() {
            sub_context.set_state(key.to_string(), value.clone());
        }
    }
    if share_history {
        for item in caller_ctx.history() {
            sub_context.append_history(item.clone());
        }
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_was_sep = false;
        } else if !prev_was_sep {
            out.push('_');
            prev_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Adapts an [`Agent`] as tool `invoke_<snake(agent.name())>`, taking a
/// single string parameter `request` (§4.7.5).
///
/// `shareState`/`shareHistory` need the *caller's* live [`Context`] at
/// invocation time, but [`ToolDyn::call`] takes only the raw JSON arguments
/// — there is no channel for a caller's context to reach a tool. Rather than
/// widen `ToolDyn`'s signature for every tool in the workspace, this holds an
/// interior-mutable snapshot populated by [`SubAgentTool::sync_caller_context`],
/// which orchestrators ([`crate::Hierarchical`]) call once per entry point,
/// immediately before driving the turn loop that owns this tool. Sharing
/// therefore reflects the enclosing agent's context at that call's
/// invocation start, not live mid-run mutations, and a sub-agent tool nested
/// two or more levels below an orchestrator's entry point (a worker's tool,
/// reached through a manager's own sub-agent tool) keeps whichever snapshot
/// it was last synced with rather than refreshing on every hop.
pub struct SubAgentTool {
    tool_name: String,
    description: String,
    agent: Arc<Agent>,
    share_state: bool,
    share_history: bool,
    caller_context: Mutex<Option<Context>>,
}

impl SubAgentTool {
    /// Wrap `agent` as a tool. Defaults match §4.7.5: `shareState = true`,
    /// `shareHistory = false`.
    pub fn new(agent: Arc<Agent>) -> Self {
        let tool_name = format!("invoke_{}", to_snake_case(agent.name()));
        let description = format!("Delegate a request to the '{}' agent.", agent.name());
        Self {
            tool_name,
            description,
            agent,
            share_state: true,
            share_history: false,
            caller_context: Mutex::new(None),
        }
    }

    /// Override the generated description shown to the calling model.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the caller's `Context` state map is copied into the
    /// sub-agent's context before it runs. Default `true`.
    #[must_use]
    pub fn share_state(mut self, share: bool) -> Self {
        self.share_state = share;
        self
    }

    /// Whether the caller's history is prepended to the sub-agent's context
    /// before it runs. Default `false`.
    #[must_use]
    pub fn share_history(mut self, share: bool) -> Self {
        self.share_history = share;
        self
    }

    /// Snapshot `ctx` as the context to share on the next invocation(s),
    /// until the next call to this method.
    pub fn sync_caller_context(&self, ctx: &Context) {
        *self.caller_context.lock().expect("caller_context mutex poisoned") = Some(ctx.copy());
    }
}

impl ToolDyn for SubAgentTool {
    fn name(&self) -> &str {
        &self.tool_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "The request to hand to the sub-agent.",
                }
            },
            "required": ["request"],
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let request = input
                .get("request")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing `request` string field".into()))?
                .to_string();

            let mut sub_context = Context::seeded(request);
            if let Some(caller_ctx) = self
                .caller_context
                .lock()
                .expect("caller_context mutex poisoned")
                .as_ref()
            {
                merge_shared_context(&mut sub_context, caller_ctx, self.share_state, self.share_history);
            }

            match TurnLoop::run(&self.agent, sub_context).await {
                Ok(AgentResult::Success { output, .. }) => Ok(Value::String(output)),
                Ok(AgentResult::Error { exception, .. }) => {
                    Err(ToolError::ExecutionFailed(exception.to_string()))
                }
                Ok(AgentResult::Handoff { target_agent, .. }) => Err(ToolError::ExecutionFailed(
                    format!("sub-agent handed off to '{target_agent}', which sub-agent delegation cannot follow"),
                )),
                Ok(AgentResult::Paused { .. }) => Err(ToolError::ExecutionFailed(
                    "sub-agent paused awaiting a tool approval, which sub-agent delegation cannot resolve".into(),
                )),
                Err(exception) => Err(ToolError::ExecutionFailed(exception.to_string())),
            }
        })
    }
}
