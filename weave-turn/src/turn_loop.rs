//! `TurnLoop` (C4, §4.4) — the core state machine.
//!
//! Grounded on `neuron-op-react`'s `ReactOperator<P: Provider>::execute`:
//! build request → call provider → classify the response → execute tools
//! or finish → loop. Two things are new relative to the teacher, which has
//! neither: pause/resume via [`AgentRunState`] (§4.4 Resume semantics), and
//! handoff-as-loop-termination (the teacher's own `Effect::Handoff` is
//! recorded but its loop keeps going; here a handoff name match
//! unconditionally ends this agent's loop, per §3's `AgentResult::Handoff`).

use crate::agent::Agent;
use crate::hooks::{NoHooks, TurnHooks};
use crate::result::AgentResult;
use crate::run_state::{AgentRunState, ApprovalDecision, PendingToolCall};
use crate::telemetry::TelemetryEvent;
use serde_json::Value;
use std::time::{Duration, Instant};
use weave_core::{CallId, Context, HistoryItem, ToolExecution, ToolOutput, WeaveError};
use weave_responder::{OutputItem, ProviderRequest, ProviderResponse, ResponderError, ToolSchema};

async fn emit(agent: &Agent, event: TelemetryEvent) {
    for processor in &agent.telemetry_processors {
        processor.process(event.clone()).await;
    }
}

/// The turn-loop driver. Stateless — all state lives in the `Context` and
/// the accumulator fields threaded through `run_loop`.
pub struct TurnLoop;

impl TurnLoop {
    /// Run `agent` against `context` from the beginning (turn 0, no prior
    /// tool executions) until it reaches a terminal result or suspends.
    pub async fn run(agent: &Agent, context: Context) -> Result<AgentResult, WeaveError> {
        Self::run_with_hooks(agent, context, &NoHooks).await
    }

    /// Like [`TurnLoop::run`], reporting mid-loop events to `hooks` (§4.5) —
    /// the seam `StreamFacade` in `weave-stream` hangs its callbacks off.
    pub async fn run_with_hooks(
        agent: &Agent,
        context: Context,
        hooks: &dyn TurnHooks,
    ) -> Result<AgentResult, WeaveError> {
        Self::run_loop(agent, context, 0, Vec::new(), None, hooks).await
    }

    /// Resume a suspended run. `state` must be `PendingToolApproval` with an
    /// `approval_result` already set (via `approve_tool_call`/
    /// `reject_tool_call`) — anything else is a resume-contract violation
    /// (§7 category 7), surfaced as `AgentResult::Error`, not a panic.
    pub async fn resume(agent: &Agent, state: AgentRunState) -> Result<AgentResult, WeaveError> {
        Self::resume_with_hooks(agent, state, &NoHooks).await
    }

    /// Like [`TurnLoop::resume`], reporting mid-loop events to `hooks`.
    pub async fn resume_with_hooks(
        agent: &Agent,
        state: AgentRunState,
        hooks: &dyn TurnHooks,
    ) -> Result<AgentResult, WeaveError> {
        let (agent_name, mut context, current_turn, mut tool_executions, last_response, pending_tool_call, approval_result) =
            match state {
                AgentRunState::PendingToolApproval {
                    agent_name,
                    context,
                    current_turn,
                    tool_executions,
                    last_response,
                    pending_tool_call,
                    approval_result,
                } => (
                    agent_name,
                    context,
                    current_turn,
                    tool_executions,
                    last_response,
                    pending_tool_call,
                    approval_result,
                ),
                other => {
                    return Ok(AgentResult::Error {
                        exception: WeaveError::ResumeContract(
                            "can only resume a state pending tool approval".into(),
                        ),
                        turns_used: other.current_turn(),
                        history: other.context().history().to_vec(),
                    });
                }
            };

        let decision = match approval_result {
            Some(decision) => decision,
            None => {
                return Ok(AgentResult::Error {
                    exception: WeaveError::ResumeContract(
                        "cannot resume without an approval decision set".into(),
                    ),
                    turns_used: current_turn,
                    history: context.history().to_vec(),
                });
            }
        };

        let PendingToolCall {
            call_id,
            tool_name,
            arguments_json,
        } = pending_tool_call;

        let success = matches!(decision, ApprovalDecision::Approved(_));
        let (content, is_error, output) = resolve_decision(decision);
        context.append_history(HistoryItem::ToolResult {
            call_id: call_id.clone(),
            tool_name: tool_name.clone(),
            content,
            is_error,
        });
        let execution = ToolExecution {
            tool_name: tool_name.clone(),
            call_id,
            arguments_json,
            output,
            duration: Duration::ZERO,
        };
        hooks.on_tool_executed(&execution).await;
        emit(
            agent,
            TelemetryEvent::ToolExecuted {
                agent_name,
                tool_name,
                success,
            },
        )
        .await;
        tool_executions.push(execution);

        Self::run_loop(agent, context, current_turn, tool_executions, last_response, hooks).await
    }

    async fn run_loop(
        agent: &Agent,
        mut context: Context,
        mut current_turn: u32,
        mut tool_executions: Vec<ToolExecution>,
        mut last_response: Option<ProviderResponse>,
        hooks: &dyn TurnHooks,
    ) -> Result<AgentResult, WeaveError> {
        loop {
            // Step 1: precondition check.
            if current_turn >= agent.max_turns {
                let exception = WeaveError::MaxTurnsExceeded {
                    max_turns: agent.max_turns,
                };
                emit(
                    agent,
                    TelemetryEvent::Error {
                        agent_name: agent.name().to_string(),
                        message: exception.to_string(),
                    },
                )
                .await;
                return Ok(AgentResult::Error {
                    exception,
                    turns_used: current_turn,
                    history: context.history().to_vec(),
                });
            }

            // Step 2: input prep — drain queued inputs, run input
            // guardrails on turn 1 only.
            let drained = context.drain_inputs_into_history();
            if current_turn == 0 {
                for item in &drained {
                    if let HistoryItem::UserMessage { text } = item {
                        let result = agent.guardrails.check_input(text).await;
                        if let Some(reason) = failure_reason(&result) {
                            hooks.on_guardrail_failed(&reason).await;
                            emit(
                                agent,
                                TelemetryEvent::GuardrailFailed {
                                    agent_name: agent.name().to_string(),
                                    reason: reason.clone(),
                                },
                            )
                            .await;
                            return Ok(AgentResult::Error {
                                exception: WeaveError::Guardrail(reason),
                                turns_used: current_turn,
                                history: context.history().to_vec(),
                            });
                        }
                    }
                }
            }

            hooks.on_turn_start(current_turn + 1).await;
            emit(
                agent,
                TelemetryEvent::TurnStart {
                    agent_name: agent.name().to_string(),
                    turn: current_turn + 1,
                },
            )
            .await;

            // Step 3: build the request.
            let request = build_request(agent, &context);

            // Step 4: invoke the responder, respecting retryPolicy.
            let response = match invoke_with_retry(agent, request).await {
                Ok(response) => response,
                Err(err) => {
                    let exception = WeaveError::Transport(err.to_string());
                    emit(
                        agent,
                        TelemetryEvent::Error {
                            agent_name: agent.name().to_string(),
                            message: exception.to_string(),
                        },
                    )
                    .await;
                    return Ok(AgentResult::Error {
                        exception,
                        turns_used: current_turn,
                        history: context.history().to_vec(),
                    });
                }
            };

            // Step 5: increment turn.
            current_turn += 1;
            tracing::debug!(agent = agent.name(), turn = current_turn, "turn complete");
            hooks.on_turn_complete(&response).await;
            emit(
                agent,
                TelemetryEvent::TurnComplete {
                    agent_name: agent.name().to_string(),
                    turn: current_turn,
                },
            )
            .await;

            // Step 6: classify outputs and append them to history in order.
            let function_calls: Vec<(String, String, String)> =
                response.function_calls().map(|(c, n, a)| (c.to_string(), n.to_string(), a.to_string())).collect();
            let text = response.text();
            for item in &response.output {
                match item {
                    OutputItem::Message { text } => {
                        context.append_history(HistoryItem::AssistantMessage { text: text.clone() });
                    }
                    OutputItem::FunctionCall {
                        call_id,
                        name,
                        arguments,
                    } => {
                        let arguments_json = parse_arguments(arguments);
                        context.append_history(HistoryItem::ToolCall {
                            call_id: CallId::new(call_id.clone()),
                            name: name.clone(),
                            arguments: arguments_json,
                        });
                    }
                }
            }
            last_response = Some(response);

            // Step 7: decision tree, in priority order.
            if !function_calls.is_empty() {
                // (a) function-calls present.
                for (call_id, name, arguments) in function_calls {
                    let call_id = CallId::new(call_id);
                    let arguments_json = parse_arguments(&arguments);

                    if let Some(handoff) = agent.handoffs.iter().find(|h| h.tool_name() == name) {
                        if let Some(message) = arguments_json.get("message").and_then(Value::as_str) {
                            context.add_input(message.to_string());
                        }
                        return Ok(AgentResult::Handoff {
                            target_agent: handoff.target_name().to_string(),
                            context,
                            turns_used: current_turn,
                        });
                    }

                    let Some(tool) = agent.tools.iter().find(|t| t.name() == name) else {
                        context.append_history(HistoryItem::ToolResult {
                            call_id,
                            tool_name: name,
                            content: "unknown tool".into(),
                            is_error: true,
                        });
                        continue;
                    };

                    if tool.requires_confirmation() {
                        if let Some(approved) = hooks.on_tool_call_pending(&name, &arguments_json).await {
                            let decision = if approved {
                                ApprovalDecision::Approved(String::new())
                            } else {
                                ApprovalDecision::Rejected(None)
                            };
                            let success = matches!(decision, ApprovalDecision::Approved(_));
                            let (content, is_error, output) = resolve_decision(decision);
                            context.append_history(HistoryItem::ToolResult {
                                call_id: call_id.clone(),
                                tool_name: name.clone(),
                                content,
                                is_error,
                            });
                            let execution = ToolExecution {
                                tool_name: name,
                                call_id,
                                arguments_json,
                                output,
                                duration: Duration::ZERO,
                            };
                            hooks.on_tool_executed(&execution).await;
                            emit(
                                agent,
                                TelemetryEvent::ToolExecuted {
                                    agent_name: agent.name().to_string(),
                                    tool_name: execution.tool_name.clone(),
                                    success,
                                },
                            )
                            .await;
                            tool_executions.push(execution);
                            continue;
                        }

                        let state = AgentRunState::PendingToolApproval {
                            agent_name: agent.name().to_string(),
                            context,
                            current_turn,
                            tool_executions,
                            last_response,
                            pending_tool_call: PendingToolCall {
                                call_id,
                                tool_name: name,
                                arguments_json,
                            },
                            approval_result: None,
                        };
                        hooks.on_pause(&state).await;
                        return Ok(AgentResult::Paused { state });
                    }

                    let start = Instant::now();
                    let call_result = tool.call(arguments_json.clone()).await;
                    let duration = start.elapsed();
                    let output = match call_result {
                        Ok(value) => ToolOutput::completed(value_to_content(&value)),
                        Err(err) => ToolOutput::error(err.to_string()),
                    };
                    context.append_history(HistoryItem::ToolResult {
                        call_id: call_id.clone(),
                        tool_name: name.clone(),
                        content: output.content.clone(),
                        is_error: !output.is_success(),
                    });
                    let execution = ToolExecution {
                        tool_name: name,
                        call_id,
                        arguments_json,
                        output,
                        duration,
                    };
                    hooks.on_tool_executed(&execution).await;
                    emit(
                        agent,
                        TelemetryEvent::ToolExecuted {
                            agent_name: agent.name().to_string(),
                            tool_name: execution.tool_name.clone(),
                            success: execution.output.is_success(),
                        },
                    )
                    .await;
                    tool_executions.push(execution);
                }
                // Loop back to step 1 at the same turn counter already
                // incremented in step 5.
                continue;
            }

            if let Some(text) = text {
                // (b) no function-calls, text produced.
                let result = agent.guardrails.check_output(&text).await;
                if let Some(reason) = failure_reason(&result) {
                    hooks.on_guardrail_failed(&reason).await;
                    emit(
                        agent,
                        TelemetryEvent::GuardrailFailed {
                            agent_name: agent.name().to_string(),
                            reason: reason.clone(),
                        },
                    )
                    .await;
                    return Ok(AgentResult::Error {
                        exception: WeaveError::Guardrail(reason),
                        turns_used: current_turn,
                        history: context.history().to_vec(),
                    });
                }
                let parsed = if agent.is_structured() {
                    match serde_json::from_str::<Value>(&text) {
                        Ok(value) => Some(value),
                        Err(err) => {
                            let exception = WeaveError::Parse(err.to_string());
                            emit(
                                agent,
                                TelemetryEvent::Error {
                                    agent_name: agent.name().to_string(),
                                    message: exception.to_string(),
                                },
                            )
                            .await;
                            return Ok(AgentResult::Error {
                                exception,
                                turns_used: current_turn,
                                history: context.history().to_vec(),
                            });
                        }
                    }
                } else {
                    None
                };
                emit(
                    agent,
                    TelemetryEvent::Complete {
                        agent_name: agent.name().to_string(),
                        turns_used: current_turn,
                    },
                )
                .await;
                return Ok(AgentResult::Success {
                    output: text,
                    final_response: last_response,
                    parsed,
                    tool_executions,
                    turns_used: current_turn,
                    history: context.history().to_vec(),
                });
            }

            // (c) neither text nor calls.
            emit(
                agent,
                TelemetryEvent::Complete {
                    agent_name: agent.name().to_string(),
                    turns_used: current_turn,
                },
            )
            .await;
            return Ok(AgentResult::Success {
                output: String::new(),
                final_response: last_response,
                parsed: None,
                tool_executions,
                turns_used: current_turn,
                history: context.history().to_vec(),
            });
        }
    }
}

fn failure_reason(result: &weave_core::GuardrailResult) -> Option<String> {
    (!result.is_passed()).then(|| result.reason().unwrap_or_default().to_string())
}

/// Turns an `ApprovalDecision` into the `ToolResult` content/error flag and
/// the `ToolOutput` to record — shared by `resume_with_hooks` and
/// `run_loop`'s inline `on_tool_call_pending` approve/reject path so the
/// synthesis logic (no handler ever invoked) lives in exactly one place.
fn resolve_decision(decision: ApprovalDecision) -> (String, bool, ToolOutput) {
    match decision {
        ApprovalDecision::Approved(output) => (output.clone(), false, ToolOutput::completed(output)),
        ApprovalDecision::Rejected(reason) => {
            let content = reason.unwrap_or_else(|| "user denied".to_string());
            (content.clone(), true, ToolOutput::error(content))
        }
    }
}

fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

fn value_to_content(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn build_request(agent: &Agent, context: &Context) -> ProviderRequest {
    let mut tools: Vec<ToolSchema> = agent
        .tools
        .iter()
        .map(|tool| ToolSchema {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        })
        .collect();
    tools.extend(agent.handoffs.iter().map(|handoff| ToolSchema {
        name: handoff.tool_name(),
        description: handoff.description().to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"],
        }),
    }));

    ProviderRequest {
        model: agent.model.clone(),
        instructions: agent.instructions.clone(),
        input_items: context.history().to_vec(),
        tools,
        response_format: agent.output_type.clone(),
        temperature: agent.temperature,
        max_output_tokens: agent.max_output_tokens,
        metadata: agent.metadata.clone(),
    }
}

async fn invoke_with_retry(
    agent: &Agent,
    request: ProviderRequest,
) -> Result<ProviderResponse, ResponderError> {
    let policy = agent.retry_policy.unwrap_or_default();
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match agent.responder.respond(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                if policy.should_retry(&err, attempt) {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                    continue;
                }
                return Err(err);
            }
        }
    }
}
