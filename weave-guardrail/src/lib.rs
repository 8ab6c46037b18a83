#![deny(missing_docs)]
//! Guardrail Gate (C3, §4.3) for the weave agentic execution core.
//!
//! [`InputGuardrail`] and [`OutputGuardrail`] use RPITIT and are erased via
//! the manual `Erased*` wrapper pattern (RPITIT is not dyn-compatible), the
//! same shape the teacher uses for its own guardrail traits. [`GuardrailGate`]
//! holds two ordered collections and runs them in insertion order, stopping
//! at the first `Failed`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use weave_core::GuardrailResult;

/// A policy predicate run on the user's raw input text before the LLM call
/// (§4.3, §4.4 step 2).
pub trait InputGuardrail: Send + Sync {
    /// Check the input text.
    fn check(&self, input: &str) -> impl Future<Output = GuardrailResult> + Send;
}

/// A policy predicate run on the assistant's final text after the LLM call
/// (§4.3, §4.4 step 7b).
pub trait OutputGuardrail: Send + Sync {
    /// Check the output text.
    fn check(&self, output: &str) -> impl Future<Output = GuardrailResult> + Send;
}

/// Dyn-compatible wrapper for [`InputGuardrail`].
pub trait ErasedInputGuardrail: Send + Sync {
    /// Check input, returning a boxed future.
    fn check_dyn<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = GuardrailResult> + Send + 'a>>;
}

impl<T: InputGuardrail> ErasedInputGuardrail for T {
    fn check_dyn<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = GuardrailResult> + Send + 'a>> {
        Box::pin(self.check(input))
    }
}

/// Dyn-compatible wrapper for [`OutputGuardrail`].
pub trait ErasedOutputGuardrail: Send + Sync {
    /// Check output, returning a boxed future.
    fn check_dyn<'a>(
        &'a self,
        output: &'a str,
    ) -> Pin<Box<dyn Future<Output = GuardrailResult> + Send + 'a>>;
}

impl<T: OutputGuardrail> ErasedOutputGuardrail for T {
    fn check_dyn<'a>(
        &'a self,
        output: &'a str,
    ) -> Pin<Box<dyn Future<Output = GuardrailResult> + Send + 'a>> {
        Box::pin(self.check(output))
    }
}

/// Ordered input/output guardrail collections (§4.3).
///
/// `check_input`/`check_output` run their respective collection in insertion
/// order and return the first `Failed`, short-circuiting the rest.
#[derive(Clone, Default)]
pub struct GuardrailGate {
    input_guardrails: Vec<Arc<dyn ErasedInputGuardrail>>,
    output_guardrails: Vec<Arc<dyn ErasedOutputGuardrail>>,
}

impl GuardrailGate {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input guardrail, run after any already added.
    pub fn add_input_guardrail<G: InputGuardrail + 'static>(&mut self, guardrail: G) -> &mut Self {
        self.input_guardrails.push(Arc::new(guardrail));
        self
    }

    /// Append an output guardrail, run after any already added.
    pub fn add_output_guardrail<G: OutputGuardrail + 'static>(
        &mut self,
        guardrail: G,
    ) -> &mut Self {
        self.output_guardrails.push(Arc::new(guardrail));
        self
    }

    /// Run input guardrails in order against `input`, stopping at the first
    /// `Failed`. Returns `Passed` if the collection is empty or all pass.
    pub async fn check_input(&self, input: &str) -> GuardrailResult {
        for guardrail in &self.input_guardrails {
            let result = guardrail.check_dyn(input).await;
            if !result.is_passed() {
                return result;
            }
        }
        GuardrailResult::Passed
    }

    /// Run output guardrails in order against `output`, stopping at the
    /// first `Failed`. Returns `Passed` if the collection is empty or all
    /// pass.
    pub async fn check_output(&self, output: &str) -> GuardrailResult {
        for guardrail in &self.output_guardrails {
            let result = guardrail.check_dyn(output).await;
            if !result.is_passed() {
                return result;
            }
        }
        GuardrailResult::Passed
    }

    /// Number of registered input guardrails.
    pub fn input_len(&self) -> usize {
        self.input_guardrails.len()
    }

    /// Number of registered output guardrails.
    pub fn output_len(&self) -> usize {
        self.output_guardrails.len()
    }
}
