//! Handoff targets (§3, §4.4 decision tree branch (a)).
//!
//! A handoff names a target agent by stable identity, never by owning
//! reference (§9) — the orchestrator resolves the name to a live agent
//! after the loop returns `AgentResult::Handoff`.

/// One outbound handoff an agent can offer the model as a callable tool.
#[derive(Debug, Clone)]
pub struct Handoff {
    target_name: String,
    description: String,
}

impl Handoff {
    /// Declare a handoff to the agent named `target_name`.
    pub fn new(target_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            description: description.into(),
        }
    }

    /// The target agent's name.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Description shown to the model for this handoff tool.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The generated tool name the model calls to trigger this handoff:
    /// `transfer_to_<snake(target_name)>` (§3 invariant).
    pub fn tool_name(&self) -> String {
        format!("transfer_to_{}", to_snake_case(&self.target_name))
    }
}

/// Lowercases and replaces runs of non-alphanumeric characters with a
/// single underscore, matching the teacher's tool-name sanitization in
/// `neuron-tool`'s `SubAgentTool` naming helper.
pub(crate) fn to_snake_case(name: &str) -> String {
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
