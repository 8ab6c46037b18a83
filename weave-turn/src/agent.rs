//! `Agent`/`AgentBuilder` — the immutable-after-build configuration record
//! (§3), generalized from the teacher's `ReactConfig`/`ReactOperator` split:
//! here the static config (`Agent`) and the loop driver (`TurnLoop`) are
//! fully separated so the same loop implementation runs any agent.

use crate::handoff::Handoff;
use crate::telemetry::TelemetryProcessor;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use weave_context::ContextManagementStrategy;
use weave_core::WeaveError;
use weave_guardrail::{GuardrailGate, InputGuardrail, OutputGuardrail};
use weave_memory::Memory;
use weave_responder::{DynResponder, RetryPolicy};
use weave_tool::ToolDyn;

/// Pairing of a [`ContextManagementStrategy`] with the token budget it's
/// evaluated against (§6.2, §6.3).
#[derive(Clone)]
pub struct ContextManagementConfig {
    /// The compaction strategy.
    pub strategy: Arc<dyn ContextManagementStrategy>,
    /// Token budget the strategy compacts against.
    pub budget: usize,
}

/// An agent's immutable configuration (§3): model, instructions, tools,
/// handoffs, guardrails, and the collaborators the turn loop needs.
///
/// Built exclusively through [`AgentBuilder::build`], which validates every
/// invariant eagerly (§7 category 1) — there is no way to construct an
/// `Agent` that violates them.
pub struct Agent {
    pub(crate) name: String,
    pub(crate) model: String,
    pub(crate) instructions: String,
    pub(crate) responder: Arc<dyn DynResponder>,
    pub(crate) max_turns: u32,
    pub(crate) temperature: Option<f64>,
    pub(crate) max_output_tokens: Option<u32>,
    pub(crate) tools: Vec<Arc<dyn ToolDyn>>,
    pub(crate) handoffs: Vec<Handoff>,
    pub(crate) guardrails: GuardrailGate,
    pub(crate) telemetry_processors: Vec<Arc<dyn TelemetryProcessor>>,
    pub(crate) output_type: Option<Value>,
    pub(crate) memory: Option<Arc<dyn Memory>>,
    pub(crate) context_management: Option<ContextManagementConfig>,
    pub(crate) retry_policy: Option<RetryPolicy>,
    pub(crate) metadata: Value,
}

impl Agent {
    /// Start building an agent with the three required fields.
    pub fn builder(
        name: impl Into<String>,
        model: impl Into<String>,
        responder: Arc<dyn DynResponder>,
    ) -> AgentBuilder {
        AgentBuilder::new(name, model, responder)
    }

    /// The agent's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Configured turn limit.
    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Whether this is a structured agent (`outputType` set, §4.4).
    pub fn is_structured(&self) -> bool {
        self.output_type.is_some()
    }
}

/// Builder for [`Agent`]. All fields except `name`/`model`/`responder` are
/// optional and default per §3.
pub struct AgentBuilder {
    name: String,
    model: String,
    instructions: String,
    responder: Arc<dyn DynResponder>,
    max_turns: u32,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
    tools: Vec<Arc<dyn ToolDyn>>,
    handoffs: Vec<Handoff>,
    guardrails: GuardrailGate,
    telemetry_processors: Vec<Arc<dyn TelemetryProcessor>>,
    output_type: Option<Value>,
    memory: Option<Arc<dyn Memory>>,
    context_management: Option<ContextManagementConfig>,
    retry_policy: Option<RetryPolicy>,
    metadata: Value,
}

impl AgentBuilder {
    /// Start a builder with the three required fields and §3's defaults
    /// (`maxTurns = 10`, no temperature/token cap, empty collections).
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        responder: Arc<dyn DynResponder>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instructions: String::new(),
            responder,
            max_turns: 10,
            temperature: None,
            max_output_tokens: None,
            tools: Vec::new(),
            handoffs: Vec::new(),
            guardrails: GuardrailGate::new(),
            telemetry_processors: Vec::new(),
            output_type: None,
            memory: None,
            context_management: None,
            retry_policy: None,
            metadata: Value::Object(Default::default()),
        }
    }

    /// System prompt / instructions.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Override the default turn limit (`>= 1`, validated at `build()`).
    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Sampling temperature (`0.0..=2.0`, validated at `build()`).
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Maximum output tokens (`> 0`, validated at `build()`).
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Register a function tool, in call order.
    pub fn tool(mut self, tool: Arc<dyn ToolDyn>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Register a handoff target, in call order.
    pub fn handoff(mut self, handoff: Handoff) -> Self {
        self.handoffs.push(handoff);
        self
    }

    /// Append an input guardrail, run after any already added.
    pub fn input_guardrail<G: InputGuardrail + 'static>(mut self, guardrail: G) -> Self {
        self.guardrails.add_input_guardrail(guardrail);
        self
    }

    /// Append an output guardrail, run after any already added.
    pub fn output_guardrail<G: OutputGuardrail + 'static>(mut self, guardrail: G) -> Self {
        self.guardrails.add_output_guardrail(guardrail);
        self
    }

    /// Register a telemetry processor, in call order.
    pub fn telemetry_processor(mut self, processor: Arc<dyn TelemetryProcessor>) -> Self {
        self.telemetry_processors.push(processor);
        self
    }

    /// Set the structured-output JSON schema, making this a structured agent.
    pub fn output_type(mut self, schema: Value) -> Self {
        self.output_type = Some(schema);
        self
    }

    /// Bind a memory store.
    pub fn memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Configure context compaction.
    pub fn context_management(
        mut self,
        strategy: Arc<dyn ContextManagementStrategy>,
        budget: usize,
    ) -> Self {
        self.context_management = Some(ContextManagementConfig { strategy, budget });
        self
    }

    /// Override the default (never-retry) transport retry policy.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    /// Caller-supplied metadata passthrough.
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate and build the agent (§7 category 1: configuration errors
    /// are raised here, eagerly, never inside the loop).
    pub fn build(self) -> Result<Agent, WeaveError> {
        if self.name.is_empty() {
            return Err(WeaveError::Configuration("name must not be empty".into()));
        }
        if self.model.is_empty() {
            return Err(WeaveError::Configuration("model must not be empty".into()));
        }
        if self.max_turns < 1 {
            return Err(WeaveError::Configuration("maxTurns must be >= 1".into()));
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(WeaveError::Configuration(
                    "temperature must be within [0.0, 2.0]".into(),
                ));
            }
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            if max_output_tokens == 0 {
                return Err(WeaveError::Configuration(
                    "maxOutputTokens must be > 0".into(),
                ));
            }
        }

        let mut tool_names = HashSet::with_capacity(self.tools.len());
        for tool in &self.tools {
            if !tool_names.insert(tool.name().to_string()) {
                return Err(WeaveError::Configuration(format!(
                    "duplicate tool name: {}",
                    tool.name()
                )));
            }
        }
        for handoff in &self.handoffs {
            let handoff_tool_name = handoff.tool_name();
            if tool_names.contains(&handoff_tool_name) {
                return Err(WeaveError::Configuration(format!(
                    "handoff tool name collides with a regular tool: {handoff_tool_name}"
                )));
            }
        }

        Ok(Agent {
            name: self.name,
            model: self.model,
            instructions: self.instructions,
            responder: self.responder,
            max_turns: self.max_turns,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            tools: self.tools,
            handoffs: self.handoffs,
            guardrails: self.guardrails,
            telemetry_processors: self.telemetry_processors,
            output_type: self.output_type,
            memory: self.memory,
            context_management: self.context_management,
            retry_policy: self.retry_policy,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockResponder;

    fn responder() -> Arc<dyn DynResponder> {
        Arc::new(MockResponder::new(vec![]))
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Agent::builder("", "gpt", responder()).build().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn zero_max_turns_is_rejected() {
        let err = Agent::builder("a", "gpt", responder())
            .max_turns(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("maxTurns"));
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let err = Agent::builder("a", "gpt", responder())
            .temperature(2.5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn zero_max_output_tokens_is_rejected() {
        let err = Agent::builder("a", "gpt", responder())
            .max_output_tokens(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("maxOutputTokens"));
    }

    #[test]
    fn default_max_turns_is_ten() {
        let agent = Agent::builder("a", "gpt", responder()).build().unwrap();
        assert_eq!(agent.max_turns(), 10);
    }

    #[test]
    fn handoff_colliding_with_tool_name_is_rejected() {
        use crate::testutil::EchoTool;
        let err = Agent::builder("a", "gpt", responder())
            .tool(Arc::new(EchoTool::new("transfer_to_b")))
            .handoff(Handoff::new("b", "hands off to b"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("transfer_to_b"));
    }
}
