//! Network (§4.7.4) — a group of peer agents discussing (sequential rounds
//! over a shared rolling context) or broadcasting (one concurrent round) a
//! topic. Discuss is grounded on `neuron-orch-local::LocalOrch`'s
//! sequential-dispatch shape generalized to loop over rounds; Broadcast
//! reuses `Parallel::run_all`'s concurrent-fan-out pattern for its single
//! round.

use std::sync::Arc;
use weave_core::{Context, WeaveError};
use weave_turn::{Agent, AgentResult, TurnLoop};

/// One peer's contribution during a round (§4.7.4).
#[derive(Debug, Clone)]
pub struct Contribution {
    /// Round number, starting at 1.
    pub round: u32,
    /// Name of the contributing agent.
    pub agent_name: String,
    /// The agent's text for this round. Carries a human-readable
    /// description of the failure instead of the agent's own text when
    /// that round's run didn't produce a `Success`.
    pub text: String,
}

/// Accessors over a [`Network`] run's accumulated contributions (§4.7.4).
#[derive(Debug)]
pub struct NetworkResult {
    contributions: Vec<Contribution>,
    synthesis: Option<AgentResult>,
}

impl NetworkResult {
    /// Every contribution, in the order peers produced them.
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Contributions from one named agent, across all rounds.
    pub fn contributions_from(&self, agent_name: &str) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.agent_name == agent_name)
            .collect()
    }

    /// Contributions from one round.
    pub fn contributions_from_round(&self, round: u32) -> Vec<&Contribution> {
        self.contributions.iter().filter(|c| c.round == round).collect()
    }

    /// The very last contribution recorded, if any.
    pub fn last_contribution(&self) -> Option<&Contribution> {
        self.contributions.last()
    }

    /// The synthesizer's result, if a synthesizer was configured.
    pub fn synthesis(&self) -> Option<&AgentResult> {
        self.synthesis.as_ref()
    }
}

/// Optional round-boundary callbacks for [`Network::discuss_stream`]
/// (§4.7.4).
#[derive(Default)]
pub struct NetworkStreamHandlers {
    on_round_start: Option<Box<dyn Fn(u32) + Send + Sync>>,
    on_round_complete: Option<Box<dyn Fn(&[Contribution]) + Send + Sync>>,
}

impl NetworkStreamHandlers {
    /// Start with both callbacks unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires right before a round's peers run.
    #[must_use]
    pub fn on_round_start(mut self, f: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_round_start = Some(Box::new(f));
        self
    }

    /// Fires with that round's contributions once every peer has run.
    #[must_use]
    pub fn on_round_complete(mut self, f: impl Fn(&[Contribution]) + Send + Sync + 'static) -> Self {
        self.on_round_complete = Some(Box::new(f));
        self
    }
}

/// Builds a [`Network`]: at least 2 peers, an optional synthesizer, and a
/// round limit (default 1, §4.7.4).
pub struct NetworkBuilder {
    peers: Vec<Arc<Agent>>,
    synthesizer: Option<Arc<Agent>>,
    max_rounds: u32,
}

impl NetworkBuilder {
    /// Start with the peer list.
    pub fn new(peers: Vec<Arc<Agent>>) -> Self {
        Self {
            peers,
            synthesizer: None,
            max_rounds: 1,
        }
    }

    /// Agent that combines all contributions after `discuss`'s final round.
    #[must_use]
    pub fn synthesizer(mut self, agent: Arc<Agent>) -> Self {
        self.synthesizer = Some(agent);
        self
    }

    /// Override the default round count of 1 (`discuss` only; `broadcast`
    /// always runs exactly one round).
    #[must_use]
    pub fn max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Validate (`>= 2` peers, `max_rounds >= 1`) and build.
    pub fn build(self) -> Result<Network, WeaveError> {
        if self.peers.len() < 2 {
            return Err(WeaveError::Configuration(
                "a network needs at least 2 peer agents".into(),
            ));
        }
        if self.max_rounds < 1 {
            return Err(WeaveError::Configuration("maxRounds must be >= 1".into()));
        }
        Ok(Network {
            peers: self.peers,
            synthesizer: self.synthesizer,
            max_rounds: self.max_rounds,
        })
    }
}

/// A group of peer agents that discuss (iteratively) or broadcast (once) a
/// topic (§4.7.4).
pub struct Network {
    peers: Vec<Arc<Agent>>,
    synthesizer: Option<Arc<Agent>>,
    max_rounds: u32,
}

fn contribution_text(result: &AgentResult) -> String {
    match result {
        AgentResult::Success { output, .. } => output.clone(),
        AgentResult::Error { exception, .. } => format!("(error: {exception})"),
        AgentResult::Paused { .. } => "(paused awaiting approval)".to_string(),
        AgentResult::Handoff { target_agent, .. } => format!("(handed off to {target_agent})"),
    }
}

fn round_prompt(topic: &str, prior: &[Contribution], peer_name: &str) -> String {
    let mut prompt = format!("Topic: {topic}\n\n");
    if prior.is_empty() {
        prompt.push_str("You are the first to contribute.\n");
    } else {
        prompt.push_str("Prior contributions:\n");
        for contribution in prior {
            prompt.push_str(&format!(
                "[round {}] {}: {}\n",
                contribution.round, contribution.agent_name, contribution.text
            ));
        }
    }
    prompt.push_str(&format!("\n{peer_name}, add your contribution.\n"));
    prompt
}

fn synthesis_prompt(topic: &str, contributions: &[Contribution]) -> String {
    let mut prompt = format!("Topic: {topic}\n\nAll contributions:\n");
    for contribution in contributions {
        prompt.push_str(&format!(
            "[round {}] {}: {}\n",
            contribution.round, contribution.agent_name, contribution.text
        ));
    }
    prompt.push_str("\nSynthesize these into a single combined answer.");
    prompt
}

async fn run_round(peers: &[Arc<Agent>], topic: &str, round: u32, contributions: &mut Vec<Contribution>) {
    for peer in peers {
        let prompt = round_prompt(topic, contributions, peer.name());
        let result = TurnLoop::run(peer, Context::seeded(prompt))
            .await
            .unwrap_or_else(|exception| AgentResult::Error {
                exception,
                turns_used: 0,
                history: Vec::new(),
            });
        contributions.push(Contribution {
            round,
            agent_name: peer.name().to_string(),
            text: contribution_text(&result),
        });
    }
}

impl Network {
    /// Start building a network over `peers`.
    pub fn builder(peers: Vec<Arc<Agent>>) -> NetworkBuilder {
        NetworkBuilder::new(peers)
    }

    /// Sequential rounds over a shared rolling context: each peer sees
    /// every prior contribution, including earlier ones from its own
    /// round. Runs the synthesizer (if configured) once, after the final
    /// round (§4.7.4).
    pub async fn discuss(&self, topic: &str) -> Result<NetworkResult, WeaveError> {
        let mut contributions = Vec::new();
        for round in 1..=self.max_rounds {
            run_round(&self.peers, topic, round, &mut contributions).await;
        }
        self.finish(topic, contributions).await
    }

    /// Like [`Network::discuss`], additionally firing round-boundary
    /// callbacks.
    pub async fn discuss_stream(
        &self,
        topic: &str,
        handlers: NetworkStreamHandlers,
    ) -> Result<NetworkResult, WeaveError> {
        let mut contributions = Vec::new();
        for round in 1..=self.max_rounds {
            if let Some(f) = &handlers.on_round_start {
                f(round);
            }
            let before = contributions.len();
            run_round(&self.peers, topic, round, &mut contributions).await;
            if let Some(f) = &handlers.on_round_complete {
                f(&contributions[before..]);
            }
        }
        self.finish(topic, contributions).await
    }

    /// One concurrent round, no iteration: every peer responds to the raw
    /// topic independently, with no visibility into each other's output
    /// (§4.7.4). The synthesizer, if configured, is not invoked — synthesis
    /// is a `discuss`-only feature per §4.7.4.
    pub async fn broadcast(&self, topic: &str) -> NetworkResult {
        let handles: Vec<_> = self
            .peers
            .iter()
            .map(|peer| {
                let peer = Arc::clone(peer);
                let topic = topic.to_string();
                tokio::spawn(async move {
                    let name = peer.name().to_string();
                    let result = TurnLoop::run(&peer, Context::seeded(topic))
                        .await
                        .unwrap_or_else(|exception| AgentResult::Error {
                            exception,
                            turns_used: 0,
                            history: Vec::new(),
                        });
                    (name, result)
                })
            })
            .collect();

        let mut contributions = Vec::with_capacity(handles.len());
        for handle in handles {
            let (agent_name, result) = handle.await.unwrap_or_else(|panic| {
                (
                    "unknown".to_string(),
                    AgentResult::Error {
                        exception: WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                            format!("peer agent task panicked: {panic}"),
                        )),
                        turns_used: 0,
                        history: Vec::new(),
                    },
                )
            });
            contributions.push(Contribution {
                round: 1,
                agent_name,
                text: contribution_text(&result),
            });
        }
        NetworkResult {
            contributions,
            synthesis: None,
        }
    }

    async fn finish(&self, topic: &str, contributions: Vec<Contribution>) -> Result<NetworkResult, WeaveError> {
        let synthesis = match &self.synthesizer {
            Some(synthesizer) => {
                Some(TurnLoop::run(synthesizer, Context::seeded(synthesis_prompt(topic, &contributions))).await?)
            }
            None => None,
        };
        Ok(NetworkResult {
            contributions,
            synthesis,
        })
    }
}
