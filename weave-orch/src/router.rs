//! Router (§4.7.1) — one LLM call classifies the input against an ordered
//! list of routes, then the matched agent runs the request. Grounded on
//! `neuron-orch-local::LocalOrch`'s registry-keyed dispatch, replacing its
//! name-must-be-supplied-by-the-caller lookup with a model-driven one.

use std::sync::Arc;
use weave_core::{Context, WeaveError};
use weave_stream::StreamFacade;
use weave_turn::{Agent, AgentResult, TurnLoop};

struct Route {
    agent: Arc<Agent>,
    description: String,
}

/// Optional callbacks for [`Router::route_stream`] (§4.7.1): `on_route_selected`
/// fires once classification resolves, before the chosen agent's turns run;
/// `on_turn_start`/`on_text_delta` mirror the chosen agent's own turns same
/// as `StreamFacade`. Unset callbacks are no-ops.
#[derive(Default)]
pub struct RouterStreamHandlers {
    on_route_selected: Option<Box<dyn Fn(&Agent) + Send + Sync>>,
    on_turn_start: Option<Box<dyn Fn(u32) + Send + Sync>>,
    on_text_delta: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl RouterStreamHandlers {
    /// Start with every callback unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once the classifier has resolved a route, before it runs.
    #[must_use]
    pub fn on_route_selected(mut self, f: impl Fn(&Agent) + Send + Sync + 'static) -> Self {
        self.on_route_selected = Some(Box::new(f));
        self
    }

    /// Fires when the chosen agent starts a turn.
    #[must_use]
    pub fn on_turn_start(mut self, f: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_turn_start = Some(Box::new(f));
        self
    }

    /// Fires with the chosen agent's assistant text for a completed turn.
    #[must_use]
    pub fn on_text_delta(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_text_delta = Some(Box::new(f));
        self
    }
}

/// Builds a [`Router`]: an ordered, non-empty list of `(agent, description)`
/// routes, a classifier agent, and an optional fallback (§4.7.1).
pub struct RouterBuilder {
    classifier: Arc<Agent>,
    routes: Vec<Route>,
    fallback: Option<Arc<Agent>>,
}

impl RouterBuilder {
    /// `classifier` is a plain agent used only to pick a route — its own
    /// tools/handoffs, if any, play no part in routing.
    pub fn new(classifier: Arc<Agent>) -> Self {
        Self {
            classifier,
            routes: Vec::new(),
            fallback: None,
        }
    }

    /// Append a route, in call order. Order determines the index the
    /// classifier is asked to choose between.
    #[must_use]
    pub fn route(mut self, agent: Arc<Agent>, description: impl Into<String>) -> Self {
        self.routes.push(Route {
            agent,
            description: description.into(),
        });
        self
    }

    /// Agent to invoke when classification is unparseable or out of range.
    #[must_use]
    pub fn fallback(mut self, agent: Arc<Agent>) -> Self {
        self.fallback = Some(agent);
        self
    }

    /// Validate and build. Fails if no routes were added.
    pub fn build(self) -> Result<Router, WeaveError> {
        if self.routes.is_empty() {
            return Err(WeaveError::Configuration(
                "a router needs at least one route".into(),
            ));
        }
        Ok(Router {
            classifier: self.classifier,
            routes: self.routes,
            fallback: self.fallback,
        })
    }
}

/// Classifies input against an ordered set of routes and dispatches to the
/// chosen agent (§4.7.1).
pub struct Router {
    classifier: Arc<Agent>,
    routes: Vec<Route>,
    fallback: Option<Arc<Agent>>,
}

impl Router {
    /// Start building a router around `classifier`.
    pub fn builder(classifier: Arc<Agent>) -> RouterBuilder {
        RouterBuilder::new(classifier)
    }

    /// Run the classifier over `input` and resolve it to one of the
    /// registered routes, falling back if the classifier's answer doesn't
    /// parse to a valid route index (§4.7.1).
    pub async fn classify(&self, input: &str) -> Result<Option<Arc<Agent>>, WeaveError> {
        let prompt = self.classification_prompt(input);
        let context = Context::seeded(prompt);
        let result = TurnLoop::run(&self.classifier, context).await?;
        let chosen = match result {
            AgentResult::Success { output, .. } => self.parse_route(&output),
            _ => None,
        };
        Ok(chosen.or_else(|| self.fallback.clone()))
    }

    /// Classify `input`, then run the chosen route (or the fallback) to
    /// completion. Fails with `WeaveError::Other` if nothing matched and no
    /// fallback is configured.
    pub async fn route(&self, input: &str) -> Result<AgentResult, WeaveError> {
        let agent = self.classify(input).await?.ok_or_else(|| {
            WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                "no route matched the input and no fallback is configured".to_string(),
            ))
        })?;
        TurnLoop::run(&agent, Context::seeded(input)).await
    }

    /// Like [`Router::route`], additionally firing `handlers` — notably
    /// `on_route_selected` once classification resolves, before the chosen
    /// agent's own turn-level callbacks fire (§4.7.1 `routeStream`).
    pub async fn route_stream(
        &self,
        input: &str,
        handlers: RouterStreamHandlers,
    ) -> Result<AgentResult, WeaveError> {
        let agent = self.classify(input).await?.ok_or_else(|| {
            WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(
                "no route matched the input and no fallback is configured".to_string(),
            ))
        })?;
        if let Some(f) = &handlers.on_route_selected {
            f(&agent);
        }
        let handlers = Arc::new(handlers);
        let facade = StreamFacade::new(Arc::clone(&agent), Context::seeded(input))
            .on_turn_start({
                let handlers = Arc::clone(&handlers);
                move |turn| {
                    if let Some(f) = &handlers.on_turn_start {
                        f(turn);
                    }
                }
            })
            .on_text_delta({
                let handlers = Arc::clone(&handlers);
                move |text| {
                    if let Some(f) = &handlers.on_text_delta {
                        f(text);
                    }
                }
            });
        Ok(facade.start_blocking().await)
    }

    fn classification_prompt(&self, input: &str) -> String {
        let mut prompt = String::from(
            "Choose the route that best handles the request below. \
             Respond with ONLY the route's number, nothing else.\n\nRoutes:\n",
        );
        for (index, route) in self.routes.iter().enumerate() {
            prompt.push_str(&format!(
                "{}: {} — {}\n",
                index + 1,
                route.agent.name(),
                route.description
            ));
        }
        prompt.push_str(&format!("\nRequest: {input}\n"));
        prompt
    }

    /// Routes are numbered from 1 in the prompt (§8 Scenario 7: a classifier
    /// answer of `"1"` selects the *first* route), so the parsed index needs
    /// shifting back to a 0-based `Vec` lookup.
    fn parse_route(&self, answer: &str) -> Option<Arc<Agent>> {
        let trimmed = answer.trim();
        if let Ok(number) = trimmed.parse::<usize>() {
            let index = number.checked_sub(1)?;
            return self.routes.get(index).map(|route| route.agent.clone());
        }
        let lower = trimmed.to_ascii_lowercase();
        self.routes
            .iter()
            .find(|route| lower.contains(&route.agent.name().to_ascii_lowercase()))
            .map(|route| route.agent.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn agent_named(name: &str, reply: &str) -> Arc<Agent> {
        Arc::new(
            Agent::builder(name, "gpt", Arc::new(ScriptedResponder { text: reply.into() }))
                .build()
                .unwrap(),
        )
    }

    fn classifier(reply: &str) -> Arc<Agent> {
        agent_named("classifier", reply)
    }

    #[tokio::test]
    async fn classify_parses_a_numeric_index() {
        let router = Router::builder(classifier("1"))
            .route(agent_named("billing", "billing"), "handles billing")
            .route(agent_named("support", "support"), "handles support")
            .build()
            .unwrap();
        let chosen = router.classify("help me").await.unwrap().unwrap();
        assert_eq!(chosen.name(), "billing");
    }

    #[tokio::test]
    async fn unparseable_answer_falls_back() {
        let router = Router::builder(classifier("I'm not sure"))
            .route(agent_named("billing", "billing"), "handles billing")
            .fallback(agent_named("default", "default"))
            .build()
            .unwrap();
        let chosen = router.classify("anything").await.unwrap().unwrap();
        assert_eq!(chosen.name(), "default");
    }

    #[tokio::test]
    async fn unparseable_answer_with_no_fallback_is_absent() {
        let router = Router::builder(classifier("nonsense"))
            .route(agent_named("billing", "billing"), "handles billing")
            .build()
            .unwrap();
        assert!(router.classify("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn route_runs_the_chosen_agent() {
        let router = Router::builder(classifier("1"))
            .route(agent_named("billing", "billing reply"), "handles billing")
            .build()
            .unwrap();
        let result = router.route("what's my balance?").await.unwrap();
        match result {
            AgentResult::Success { output, .. } => assert_eq!(output, "billing reply"),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_zero_routes() {
        let err = Router::builder(classifier("0")).build().unwrap_err();
        assert!(err.to_string().contains("route"));
    }

    #[tokio::test]
    async fn route_stream_fires_on_route_selected_before_running_it() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let selected = Arc::new(std::sync::Mutex::new(String::new()));
        let deltas = Arc::new(AtomicUsize::new(0));
        let selected_clone = Arc::clone(&selected);
        let deltas_clone = Arc::clone(&deltas);
        let handlers = RouterStreamHandlers::new()
            .on_route_selected(move |agent| {
                *selected_clone.lock().unwrap() = agent.name().to_string();
            })
            .on_text_delta(move |_text| {
                deltas_clone.fetch_add(1, Ordering::SeqCst);
            });

        let router = Router::builder(classifier("1"))
            .route(agent_named("billing", "billing reply"), "handles billing")
            .build()
            .unwrap();
        let result = router.route_stream("what's my balance?", handlers).await.unwrap();

        assert_eq!(*selected.lock().unwrap(), "billing");
        assert_eq!(deltas.load(Ordering::SeqCst), 1);
        match result {
            AgentResult::Success { output, .. } => assert_eq!(output, "billing reply"),
            other => panic!("expected Success, got {other:?}"),
        }
    }
}
