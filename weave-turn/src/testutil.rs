#![cfg(test)]
//! Shared test fixtures: a scripted [`Responder`] and scripted tools, the
//! direct analogue of the teacher's `MockProvider`/`EchoTool` test doubles
//! in `neuron-op-react`'s own test module.

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use weave_responder::{
    OutputItem, ProviderRequest, ProviderResponse, Responder, ResponderError, TokenUsage,
};
use weave_tool::{ToolDyn, ToolError};

/// Plays back a fixed script of responses, one per call, and counts how
/// many times it was invoked (§8 scenario 4: `mock.requestCount`).
pub struct MockResponder {
    script: Mutex<VecDeque<ProviderResponse>>,
    request_count: AtomicUsize,
}

impl MockResponder {
    pub fn new(script: Vec<ProviderResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            request_count: AtomicUsize::new(0),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

impl Responder for MockResponder {
    fn respond(
        &self,
        _request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ResponderError>> + Send {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        async move { next.ok_or_else(|| ResponderError::InvalidResponse("script exhausted".into())) }
    }
}

pub fn text_response(id: &str, text: &str) -> ProviderResponse {
    ProviderResponse {
        id: id.into(),
        model: "mock".into(),
        output: vec![OutputItem::Message { text: text.into() }],
        usage: TokenUsage::default(),
        cost: None,
    }
}

pub fn call_response(id: &str, call_id: &str, name: &str, arguments: Value) -> ProviderResponse {
    ProviderResponse {
        id: id.into(),
        model: "mock".into(),
        output: vec![OutputItem::FunctionCall {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }],
        usage: TokenUsage::default(),
        cost: None,
    }
}

pub fn empty_response(id: &str) -> ProviderResponse {
    ProviderResponse {
        id: id.into(),
        model: "mock".into(),
        output: vec![],
        usage: TokenUsage::default(),
        cost: None,
    }
}

/// A tool whose behavior is fully scripted by a closure, standing in for
/// `simple_tool`/`dangerous_tool` across the end-to-end scenarios.
pub struct ScriptedTool {
    name: String,
    requires_confirmation: bool,
    handler: Box<dyn Fn(Value) -> Result<Value, ToolError> + Send + Sync>,
    call_count: AtomicUsize,
}

impl ScriptedTool {
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(Value) -> Result<Value, ToolError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requires_confirmation: false,
            handler: Box::new(handler),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn gated(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl ToolDyn for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "scripted test tool"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let result = (self.handler)(input);
        Box::pin(async move { result })
    }
}

/// A trivial named tool fixture for config-validation tests.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ToolDyn for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "echoes input"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move { Ok(input) })
    }
}
