//! HandoffRunner (§3, §4.4 step 7a, §8 Scenario 5) — resolves an
//! `AgentResult::Handoff`'s `target_agent` name against a fixed table of
//! live agents and drives the target's own turn loop, repeating until the
//! chain ends in a non-handoff terminal result. Grounded on the teacher's
//! `neuron-orch-kit::OrchestratedRunner`, which interprets `Effect::Handoff`
//! the same way — enqueue a follow-up dispatch on the named agent and keep
//! draining until the queue is empty, bounded against a cycle by a max hop
//! count (there: `max_followups`).

use std::collections::HashMap;
use std::sync::Arc;
use weave_core::{Context, WeaveError};
use weave_turn::{Agent, AgentResult, TurnLoop};

/// A fixed table of agents, keyed by their own name, that a handoff may
/// target (§9: "represent agents by stable identity... the tool carries the
/// target's identity, not an owning reference").
#[derive(Default)]
pub struct HandoffRegistry {
    agents: HashMap<String, Arc<Agent>>,
}

impl HandoffRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent` under its own name (`agent.name()`). Registering a
    /// second agent under an already-used name replaces the first.
    #[must_use]
    pub fn register(mut self, agent: Arc<Agent>) -> Self {
        self.agents.insert(agent.name().to_string(), agent);
        self
    }

    /// Look up a registered agent by name.
    pub fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents.get(name).cloned()
    }
}

/// Outcome of [`HandoffRunner::run`] (§8 Scenario 5: `isHandoff`,
/// `handoffAgent.name == "B"`, `output == "Support here"`).
#[derive(Debug)]
pub struct HandoffOutcome {
    /// Names of agents handed off to, in hop order; empty if the initial
    /// agent never handed off. The last element, if any, is whichever agent
    /// actually produced `result`.
    pub chain: Vec<String>,
    /// The non-handoff terminal result the last agent in the chain produced.
    pub result: AgentResult,
}

impl HandoffOutcome {
    /// Whether this run involved at least one handoff.
    pub fn is_handoff(&self) -> bool {
        !self.chain.is_empty()
    }

    /// The name of the agent that produced `result`, if a handoff occurred.
    pub fn handoff_agent(&self) -> Option<&str> {
        self.chain.last().map(String::as_str)
    }
}

/// Drives an initial agent's run to completion, following every
/// `AgentResult::Handoff` it produces by looking up the named target in a
/// [`HandoffRegistry`] and continuing with the handoff's own enriched
/// context, until a non-handoff terminal result comes back (§3, §4.4 step
/// 7a, §8 Scenario 5).
pub struct HandoffRunner {
    registry: HandoffRegistry,
    max_hops: usize,
}

impl HandoffRunner {
    /// Build a runner around a fixed `registry` of potential handoff
    /// targets. Default `max_hops` is 16, a safety bound against a handoff
    /// cycle looping forever — same purpose as the teacher's
    /// `OrchestratedRunner::max_followups`.
    pub fn new(registry: HandoffRegistry) -> Self {
        Self { registry, max_hops: 16 }
    }

    /// Override the hop safety bound.
    #[must_use]
    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Run `agent` against `context`, following every handoff by name
    /// through the registry until a `Success`/`Error`/`Paused` result is
    /// reached, or the hop bound is exceeded, or a handoff names an agent
    /// the registry doesn't have.
    pub async fn run(&self, agent: &Agent, context: Context) -> Result<HandoffOutcome, WeaveError> {
        let mut chain = Vec::new();
        let mut result = TurnLoop::run(agent, context).await?;
        loop {
            match result {
                AgentResult::Handoff { target_agent, context, .. } => {
                    if chain.len() >= self.max_hops {
                        return Err(WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(format!(
                            "handoff chain exceeded {} hop(s) (last target '{target_agent}')",
                            self.max_hops
                        ))));
                    }
                    let Some(target) = self.registry.get(&target_agent) else {
                        return Err(WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(format!(
                            "no agent named '{target_agent}' is registered for handoff"
                        ))));
                    };
                    chain.push(target_agent);
                    result = TurnLoop::run(&target, context).await?;
                }
                other => return Ok(HandoffOutcome { chain, result: other }),
            }
        }
    }
}
