//! Hierarchical (§4.7.3) — an executive agent delegates to department
//! managers, each of whom delegates to their own workers, via
//! [`crate::SubAgentTool`]. Grounded on the teacher's `agent-runtime`
//! sub-agent spawning generalized to a fixed two-level org chart instead of
//! `SubAgentManager`'s flat named registry.

use std::collections::HashMap;
use std::sync::Arc;
use weave_core::{Context, WeaveError};
use weave_turn::{Agent, AgentBuilder, AgentResult, TurnLoop};

use crate::subagent_tool::SubAgentTool;

/// One department: a manager agent and the workers it can delegate to.
struct Department {
    manager: Arc<Agent>,
    worker_tools: Vec<Arc<SubAgentTool>>,
}

/// Builds a [`Hierarchical`] orchestrator: one executive and a map of named
/// departments, each with a manager and at least one worker (§4.7.3).
///
/// Takes `AgentBuilder`s (not built `Agent`s) for the executive and each
/// manager, because `Hierarchical` must attach a [`SubAgentTool`] per
/// department/worker before those agents are built — tools are fixed at
/// `Agent::build()` and can't be added afterward.
pub struct HierarchicalBuilder {
    executive_builder: AgentBuilder,
    departments: Vec<(String, AgentBuilder, Vec<Arc<Agent>>)>,
}

impl HierarchicalBuilder {
    /// Start with the executive's (not yet built) configuration.
    pub fn new(executive_builder: AgentBuilder) -> Self {
        Self {
            executive_builder,
            departments: Vec::new(),
        }
    }

    /// Register a department: a name, the manager's (not yet built)
    /// configuration, and its already-built workers.
    #[must_use]
    pub fn department(
        mut self,
        name: impl Into<String>,
        manager_builder: AgentBuilder,
        workers: Vec<Arc<Agent>>,
    ) -> Self {
        self.departments.push((name.into(), manager_builder, workers));
        self
    }

    /// Validate (`>= 1` department, each `>= 1` worker), wire every
    /// [`SubAgentTool`], and build the executive and managers.
    pub fn build(self) -> Result<Hierarchical, WeaveError> {
        if self.departments.is_empty() {
            return Err(WeaveError::Configuration(
                "a hierarchical orchestrator needs at least one department".into(),
            ));
        }

        let mut executive_builder = self.executive_builder;
        let mut executive_department_tools = Vec::with_capacity(self.departments.len());
        let mut departments = HashMap::with_capacity(self.departments.len());

        for (name, manager_builder, workers) in self.departments {
            if workers.is_empty() {
                return Err(WeaveError::Configuration(format!(
                    "department '{name}' needs at least one worker"
                )));
            }

            let mut manager_builder = manager_builder;
            let mut worker_tools = Vec::with_capacity(workers.len());
            for worker in &workers {
                let tool = Arc::new(SubAgentTool::new(Arc::clone(worker)));
                manager_builder = manager_builder.tool(Arc::clone(&tool));
                worker_tools.push(tool);
            }
            let manager = Arc::new(manager_builder.build()?);

            let manager_tool = Arc::new(SubAgentTool::new(Arc::clone(&manager)));
            executive_builder = executive_builder.tool(Arc::clone(&manager_tool));
            executive_department_tools.push(Arc::clone(&manager_tool));

            departments.insert(name, Department { manager, worker_tools });
        }

        let executive = Arc::new(executive_builder.build()?);

        Ok(Hierarchical {
            executive,
            executive_department_tools,
            departments,
        })
    }
}

/// An executive agent plus a fixed set of departments it can delegate to,
/// each a manager and its own workers (§4.7.3).
pub struct Hierarchical {
    executive: Arc<Agent>,
    executive_department_tools: Vec<Arc<SubAgentTool>>,
    departments: HashMap<String, Department>,
}

impl Hierarchical {
    /// Start building a hierarchy around `executive_builder`.
    pub fn builder(executive_builder: AgentBuilder) -> HierarchicalBuilder {
        HierarchicalBuilder::new(executive_builder)
    }

    /// Run the executive on `task`. The executive may delegate to any
    /// department manager (who may in turn delegate to their workers) via
    /// their wired [`SubAgentTool`]s (§4.7.3).
    pub async fn execute(&self, task: &str) -> Result<AgentResult, WeaveError> {
        tracing::debug!(departments = self.departments.len(), "hierarchical execute starting");
        let context = Context::seeded(task);
        for tool in &self.executive_department_tools {
            tool.sync_caller_context(&context);
        }
        TurnLoop::run(&self.executive, context).await
    }

    /// Run a named department's manager directly, bypassing the executive
    /// (§4.7.3). Fails if no department named `name` is registered.
    pub async fn send_to_department(&self, name: &str, task: &str) -> Result<AgentResult, WeaveError> {
        let department = self.departments.get(name).ok_or_else(|| {
            WeaveError::Other(Box::<dyn std::error::Error + Send + Sync>::from(format!(
                "no department named '{name}'"
            )))
        })?;
        let context = Context::seeded(task);
        for tool in &department.worker_tools {
            tool.sync_caller_context(&context);
        }
        TurnLoop::run(&department.manager, context).await
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

    fn builder_named(name: &str, reply: &str) -> AgentBuilder {
        Agent::builder(name, "gpt", Arc::new(ScriptedResponder { text: reply.into() }))
    }

    #[tokio::test]
    async fn execute_runs_the_executive() {
        let hierarchy = Hierarchical::builder(builder_named("executive", "executive reply"))
            .department(
                "engineering",
                builder_named("eng_manager", "manager reply"),
                vec![agent_named("worker", "worker reply")],
            )
            .build()
            .unwrap();
        let result = hierarchy.execute("ship the feature").await.unwrap();
        match result {
            AgentResult::Success { output, .. } => assert_eq!(output, "executive reply"),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_to_department_bypasses_the_executive() {
        let hierarchy = Hierarchical::builder(builder_named("executive", "executive reply"))
            .department(
                "engineering",
                builder_named("eng_manager", "manager reply"),
                vec![agent_named("worker", "worker reply")],
            )
            .build()
            .unwrap();
        let result = hierarchy.send_to_department("engineering", "fix the bug").await.unwrap();
        match result {
            AgentResult::Success { output, .. } => assert_eq!(output, "manager reply"),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_to_department_rejects_unknown_department() {
        let hierarchy = Hierarchical::builder(builder_named("executive", "executive reply"))
            .department(
                "engineering",
                builder_named("eng_manager", "manager reply"),
                vec![agent_named("worker", "worker reply")],
            )
            .build()
            .unwrap();
        let err = hierarchy.send_to_department("sales", "close a deal").await.unwrap_err();
        assert!(err.to_string().contains("sales"));
    }

    #[test]
    fn build_rejects_a_department_with_no_workers() {
        let err = Hierarchical::builder(builder_named("executive", "executive reply"))
            .department("engineering", builder_named("eng_manager", "manager reply"), vec![])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("engineering"));
    }

    #[test]
    fn build_rejects_zero_departments() {
        let err = Hierarchical::builder(builder_named("executive", "executive reply"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("department"));
    }
}
