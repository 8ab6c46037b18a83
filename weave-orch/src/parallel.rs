//! Parallel (§4.7.2) — runs a fixed, ordered set of member agents against
//! the same input concurrently, in three modes (`All`, `First`,
//! `Synthesize`). Grounded on `neuron-orch-local::LocalOrch::dispatch_many`'s
//! spawn-then-join-all pattern; `First` additionally aborts the stragglers
//! once a winner is known, which `LocalOrch` itself never needed since it
//! has no "first one wins" mode.

use std::sync::Arc;
use weave_core::{Context, WeaveError};
use weave_stream::StreamFacade;
use weave_turn::{Agent, AgentResult, TurnLoop};

/// Builds a [`Parallel`] orchestrator from an ordered, non-empty list of
/// member agents, with an optional synthesizer for `run_and_synthesize`.
pub struct ParallelBuilder {
    members: Vec<Arc<Agent>>,
    synthesizer: Option<Arc<Agent>>,
}

impl ParallelBuilder {
    /// Start with the ordered member list.
    pub fn new(members: Vec<Arc<Agent>>) -> Self {
        Self {
            members,
            synthesizer: None,
        }
    }

    /// Agent that combines member outputs in `run_and_synthesize` (§4.7.2).
    #[must_use]
    pub fn synthesizer(mut self, agent: Arc<Agent>) -> Self {
        self.synthesizer = Some(agent);
        self
    }

    /// Validate (non-empty member list) and build.
    pub fn build(self) -> Result<Parallel, WeaveError> {
        if self.members.is_empty() {
            return Err(WeaveError::Configuration(
                "a parallel orchestrator needs at least one member agent".into(),
            ));
        }
        Ok(Parallel {
            members: self.members,
            synthesizer: self.synthesizer,
        })
    }
}

/// Result of [`Parallel::run_and_synthesize`]: every member's outcome, plus
/// the synthesizer's combined result.
#[derive(Debug)]
pub struct ParallelResult {
    /// Each member's outcome, in member order.
    pub members: Vec<AgentResult>,
    /// The synthesizer's run over all member outputs.
    pub synthesis: AgentResult,
}

/// Optional per-member and aggregate callbacks for the streaming variants
/// (§4.7.2). Unset callbacks are no-ops, same shape as `StreamFacade`'s
/// fluent registry.
#[derive(Default)]
pub struct ParallelStreamHandlers {
    on_agent_turn_start: Option<Box<dyn Fn(usize, u32) + Send + Sync>>,
    on_agent_text_delta: Option<Box<dyn Fn(usize, &str) + Send + Sync>>,
    on_agent_complete: Option<Box<dyn Fn(usize, &AgentResult) + Send + Sync>>,
    on_agent_error: Option<Box<dyn Fn(usize, &WeaveError) + Send + Sync>>,
    on_complete: Option<Box<dyn Fn(&[AgentResult]) + Send + Sync>>,
    on_first_complete: Option<Box<dyn Fn(&AgentResult) + Send + Sync>>,
    on_synthesis_complete: Option<Box<dyn Fn(&AgentResult) + Send + Sync>>,
}

impl ParallelStreamHandlers {
    /// Start with every callback unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires when a member agent starts a turn.
    #[must_use]
    pub fn on_agent_turn_start(mut self, f: impl Fn(usize, u32) + Send + Sync + 'static) -> Self {
        self.on_agent_turn_start = Some(Box::new(f));
        self
    }

    /// Fires with a member agent's assistant text for a completed turn.
    #[must_use]
    pub fn on_agent_text_delta(mut self, f: impl Fn(usize, &str) + Send + Sync + 'static) -> Self {
        self.on_agent_text_delta = Some(Box::new(f));
        self
    }

    /// Fires once a member agent reaches a terminal result.
    #[must_use]
    pub fn on_agent_complete(
        mut self,
        f: impl Fn(usize, &AgentResult) + Send + Sync + 'static,
    ) -> Self {
        self.on_agent_complete = Some(Box::new(f));
        self
    }

    /// Fires alongside `on_agent_complete`, in addition to it, when a member
    /// agent's terminal result is an error (§4.7.2 `onError`; mirrors
    /// `StreamFacade`'s own error-fires-both-callbacks dispatch).
    #[must_use]
    pub fn on_agent_error(mut self, f: impl Fn(usize, &WeaveError) + Send + Sync + 'static) -> Self {
        self.on_agent_error = Some(Box::new(f));
        self
    }

    /// Fires once every member (run_all) has reached a terminal result.
    #[must_use]
    pub fn on_complete(mut self, f: impl Fn(&[AgentResult]) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Fires once the first member (run_first) resolves.
    #[must_use]
    pub fn on_first_complete(mut self, f: impl Fn(&AgentResult) + Send + Sync + 'static) -> Self {
        self.on_first_complete = Some(Box::new(f));
        self
    }

    /// Fires once the synthesizer (run_and_synthesize) completes.
    #[must_use]
    pub fn on_synthesis_complete(mut self, f: impl Fn(&AgentResult) + Send + Sync + 'static) -> Self {
        self.on_synthesis_complete = Some(Box::new(f));
        self
    }
}

/// Runs a fixed set of agents concurrently against the same input (§4.7.2).
pub struct Parallel {
    members: Vec<Arc<Agent>>,
    synthesizer: Option<Arc<Agent>>,
}

async fn run_member(agent: Arc<Agent>, input: String) -> AgentResult {
    match TurnLoop::run(&agent, Context::seeded(input)).await {
        Ok(result) => result,
        Err(exception) => AgentResult::Error {
            exception,
            turns_used: 0,
            history: Vec::new(),
        },
    }
}

async fn run_member_stream(
    index: usize,
    agent: Arc<Agent>,
    input: String,
    handlers: Arc<ParallelStreamHandlers>,
) -> AgentResult {
    let facade = StreamFacade::new(agent, Context::seeded(input))
        .on_turn_start({
            let handlers = Arc::clone(&handlers);
            move |turn| {
                if let Some(f) = &handlers.on_agent_turn_start {
                    f(index, turn);
                }
            }
        })
        .on_text_delta({
            let handlers = Arc::clone(&handlers);
            move |text| {
                if let Some(f) = &handlers.on_agent_text_delta {
                    f(index, text);
                }
            }
        });
    let result = facade.start_blocking().await;
    if let AgentResult::Error { exception, .. } = &result {
        if let Some(f) = &handlers.on_agent_error {
            f(index, exception);
        }
    }
    if let Some(f) = &handlers.on_agent_complete {
        f(index, &result);
    }
    result
}

impl Parallel {
    /// Start building a `Parallel` over `members`.
    pub fn builder(members: Vec<Arc<Agent>>) -> ParallelBuilder {
        ParallelBuilder::new(members)
    }

    /// Run every member concurrently against `input`; per-member failures
    /// are recorded in their slot rather than aborting the others (§4.7.2).
    pub async fn run_all(&self, input: &str) -> Vec<AgentResult> {
        tracing::debug!(members = self.members.len(), "parallel run_all starting");
        let handles: Vec<_> = self
            .members
            .iter()
            .map(|agent| tokio::spawn(run_member(Arc::clone(agent), input.to_string())))
            .collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|panic| AgentResult::Error {
                exception: WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                    format!("member agent task panicked: {panic}"),
                )),
                turns_used: 0,
                history: Vec::new(),
            }));
        }
        results
    }

    /// Run every member concurrently, streaming per-member callbacks, then
    /// the aggregate `on_complete`.
    pub async fn run_all_stream(&self, input: &str, handlers: ParallelStreamHandlers) -> Vec<AgentResult> {
        self.run_all_stream_shared(input, Arc::new(handlers)).await
    }

    async fn run_all_stream_shared(
        &self,
        input: &str,
        handlers: Arc<ParallelStreamHandlers>,
    ) -> Vec<AgentResult> {
        let handles: Vec<_> = self
            .members
            .iter()
            .enumerate()
            .map(|(index, agent)| {
                tokio::spawn(run_member_stream(
                    index,
                    Arc::clone(agent),
                    input.to_string(),
                    Arc::clone(&handlers),
                ))
            })
            .collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|panic| AgentResult::Error {
                exception: WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                    format!("member agent task panicked: {panic}"),
                )),
                turns_used: 0,
                history: Vec::new(),
            }));
        }
        if let Some(f) = &handlers.on_complete {
            f(&results);
        }
        results
    }

    /// Run every member concurrently; resolve as soon as the first
    /// non-error result is available, and best-effort cancel the rest
    /// (§4.7.2). Returns the last error seen if every member errored.
    pub async fn run_first(&self, input: &str) -> AgentResult {
        let mut set = tokio::task::JoinSet::new();
        for agent in &self.members {
            set.spawn(run_member(Arc::clone(agent), input.to_string()));
        }
        let mut last_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) if result.is_success() || result.is_handoff() => {
                    set.abort_all();
                    return result;
                }
                Ok(result) => last_error = Some(result),
                Err(panic) => {
                    last_error = Some(AgentResult::Error {
                        exception: WeaveError::Other(
                            Box::<dyn std::error::Error + Send + Sync>::from(format!(
                                "member agent task panicked: {panic}"
                            )),
                        ),
                        turns_used: 0,
                        history: Vec::new(),
                    })
                }
            }
        }
        last_error.unwrap_or_else(|| AgentResult::Error {
            exception: WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                "no member agents were configured".to_string(),
            )),
            turns_used: 0,
            history: Vec::new(),
        })
    }

    /// Like [`Parallel::run_first`], additionally firing streaming handlers.
    pub async fn run_first_stream(&self, input: &str, handlers: ParallelStreamHandlers) -> AgentResult {
        let handlers = Arc::new(handlers);
        let mut set = tokio::task::JoinSet::new();
        for (index, agent) in self.members.iter().enumerate() {
            set.spawn(run_member_stream(
                index,
                Arc::clone(agent),
                input.to_string(),
                Arc::clone(&handlers),
            ));
        }
        let mut last_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) if result.is_success() || result.is_handoff() => {
                    set.abort_all();
                    if let Some(f) = &handlers.on_first_complete {
                        f(&result);
                    }
                    return result;
                }
                Ok(result) => last_error = Some(result),
                Err(panic) => {
                    last_error = Some(AgentResult::Error {
                        exception: WeaveError::Other(
                            Box::<dyn std::error::Error + Send + Sync>::from(format!(
                                "member agent task panicked: {panic}"
                            )),
                        ),
                        turns_used: 0,
                        history: Vec::new(),
                    })
                }
            }
        }
        let result = last_error.unwrap_or_else(|| AgentResult::Error {
            exception: WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                "no member agents were configured".to_string(),
            )),
            turns_used: 0,
            history: Vec::new(),
        });
        if let Some(f) = &handlers.on_first_complete {
            f(&result);
        }
        result
    }

    /// Run every member (`run_all`), then invoke the synthesizer over all
    /// member outputs (§4.7.2). Fails if no synthesizer is configured.
    pub async fn run_and_synthesize(&self, input: &str) -> Result<ParallelResult, WeaveError> {
        let synthesizer = self.synthesizer.clone().ok_or_else(|| {
            WeaveError::Configuration("run_and_synthesize requires a synthesizer agent".into())
        })?;
        let members = self.run_all(input).await;
        let synthesis = TurnLoop::run(&synthesizer, Context::seeded(synthesis_prompt(input, &members))).await?;
        Ok(ParallelResult { members, synthesis })
    }

    /// Like [`Parallel::run_and_synthesize`], additionally firing streaming
    /// handlers for the member fan-out and the synthesis step.
    pub async fn run_and_synthesize_stream(
        &self,
        input: &str,
        handlers: ParallelStreamHandlers,
    ) -> Result<ParallelResult, WeaveError> {
        let synthesizer = self.synthesizer.clone().ok_or_else(|| {
            WeaveError::Configuration("run_and_synthesize_stream requires a synthesizer agent".into())
        })?;
        let handlers = Arc::new(handlers);
        let members = self.run_all_stream_shared(input, Arc::clone(&handlers)).await;
        let synthesis = TurnLoop::run(&synthesizer, Context::seeded(synthesis_prompt(input, &members))).await?;
        if let Some(f) = &handlers.on_synthesis_complete {
            f(&synthesis);
        }
        Ok(ParallelResult { members, synthesis })
    }
}

fn synthesis_prompt(input: &str, members: &[AgentResult]) -> String {
    let mut prompt = format!("Original request: {input}\n\nMember outputs:\n");
    for (index, result) in members.iter().enumerate() {
        let text = match result {
            AgentResult::Success { output, .. } => output.clone(),
            AgentResult::Error { exception, .. } => format!("(error: {exception})"),
            AgentResult::Paused { .. } => "(paused awaiting approval)".to_string(),
            AgentResult::Handoff { target_agent, .. } => format!("(handed off to {target_agent})"),
        };
        prompt.push_str(&format!("{index}: {text}\n"));
    }
    prompt.push_str("\nSynthesize these into a single combined answer.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use weave_responder::{OutputItem, ProviderRequest, ProviderResponse, Responder, ResponderError, TokenUsage};

    struct ScriptedResponder {
        text: String,
    }

    impl Responder for ScriptedResponder {
        async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, ResponderError> {
            Ok(ProviderResponse {
                id: "r1".into(),
                model: request.model,
                output: vec![OutputItem::Message {
                    text: self.text.clone(),
                }],
                usage: TokenUsage::default(),
                cost: None,
            })
        }
    }

    struct FailingResponder;

    impl Responder for FailingResponder {
        async fn respond(&self, _request: ProviderRequest) -> Result<ProviderResponse, ResponderError> {
            Err(ResponderError::BadStatus("500".into()))
        }
    }

    fn agent_named(name: &str, reply: &str) -> Arc<Agent> {
        Arc::new(
            Agent::builder(name, "gpt", Arc::new(ScriptedResponder { text: reply.into() }))
                .build()
                .unwrap(),
        )
    }

    fn failing_agent(name: &str) -> Arc<Agent> {
        Arc::new(
            Agent::builder(name, "gpt", Arc::new(FailingResponder))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn run_all_collects_ordered_results() {
        let parallel = Parallel::builder(vec![agent_named("a", "first"), agent_named("b", "second")])
            .build()
            .unwrap();
        let results = parallel.run_all("hi").await;
        assert_eq!(results.len(), 2);
        match &results[0] {
            AgentResult::Success { output, .. } => assert_eq!(output, "first"),
            other => panic!("expected Success, got {other:?}"),
        }
        match &results[1] {
            AgentResult::Success { output, .. } => assert_eq!(output, "second"),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_all_records_per_member_failures_without_aborting_siblings() {
        let parallel = Parallel::builder(vec![failing_agent("broken"), agent_named("ok", "fine")])
            .build()
            .unwrap();
        let results = parallel.run_all("hi").await;
        assert!(results[0].is_error());
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn run_first_resolves_on_the_first_success() {
        let parallel = Parallel::builder(vec![failing_agent("broken"), agent_named("ok", "winner")])
            .build()
            .unwrap();
        let result = parallel.run_first("hi").await;
        match result {
            AgentResult::Success { output, .. } => assert_eq!(output, "winner"),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_and_synthesize_combines_member_outputs() {
        let synthesizer = agent_named("synth", "combined answer");
        let parallel = Parallel::builder(vec![agent_named("a", "alpha"), agent_named("b", "beta")])
            .synthesizer(synthesizer)
            .build()
            .unwrap();
        let result = parallel.run_and_synthesize("hi").await.unwrap();
        assert_eq!(result.members.len(), 2);
        match result.synthesis {
            AgentResult::Success { output, .. } => assert_eq!(output, "combined answer"),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_and_synthesize_without_synthesizer_is_a_configuration_error() {
        let parallel = Parallel::builder(vec![agent_named("a", "alpha")]).build().unwrap();
        let err = parallel.run_and_synthesize("hi").await.unwrap_err();
        assert!(err.to_string().contains("synthesizer"));
    }

    #[test]
    fn builder_rejects_empty_member_list() {
        let err = Parallel::builder(vec![]).build().unwrap_err();
        assert!(err.to_string().contains("member"));
    }

    #[tokio::test]
    async fn run_all_stream_fires_per_member_and_aggregate_callbacks() {
        let completed = Arc::new(AtomicUsize::new(0));
        let aggregate_seen = Arc::new(AtomicUsize::new(0));
        let completed_clone = Arc::clone(&completed);
        let aggregate_clone = Arc::clone(&aggregate_seen);
        let handlers = ParallelStreamHandlers::new()
            .on_agent_complete(move |_index, _result| {
                completed_clone.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |results| {
                aggregate_clone.store(results.len(), Ordering::SeqCst);
            });
        let parallel = Parallel::builder(vec![agent_named("a", "alpha"), agent_named("b", "beta")])
            .build()
            .unwrap();
        let results = parallel.run_all_stream("hi", handlers).await;
        assert_eq!(results.len(), 2);
        assert_eq!(completed.load(Ordering::SeqCst), 2);
        assert_eq!(aggregate_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn run_all_stream_fires_on_agent_error_alongside_on_agent_complete() {
        let errors_seen = Arc::new(AtomicUsize::new(0));
        let completes_seen = Arc::new(AtomicUsize::new(0));
        let errors_clone = Arc::clone(&errors_seen);
        let completes_clone = Arc::clone(&completes_seen);
        let handlers = ParallelStreamHandlers::new()
            .on_agent_error(move |index, _err| {
                assert_eq!(index, 0);
                errors_clone.fetch_add(1, Ordering::SeqCst);
            })
            .on_agent_complete(move |_index, _result| {
                completes_clone.fetch_add(1, Ordering::SeqCst);
            });
        let parallel = Parallel::builder(vec![failing_agent("broken")]).build().unwrap();
        let results = parallel.run_all_stream("hi", handlers).await;
        assert!(results[0].is_error());
        assert_eq!(errors_seen.load(Ordering::SeqCst), 1);
        assert_eq!(completes_seen.load(Ordering::SeqCst), 1);
    }
}
