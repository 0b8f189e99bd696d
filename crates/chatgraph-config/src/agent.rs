use serde::Deserialize;

/// Agent loop behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct AgentConfig {
    pub system_prompt: Option<String>,
    /// Assistant messages allowed per user turn before the loop is cut off.
    pub max_turns: Option<usize>,
    pub max_tool_calls_per_turn: Option<usize>,
}

impl AgentConfig {
    /// Settings from the file, with unset fields taken from `fallback`.
    pub fn with_fallback(&self, fallback: AgentConfig) -> AgentConfig {
        AgentConfig {
            system_prompt: self.system_prompt.clone().or(fallback.system_prompt),
            max_turns: self.max_turns.or(fallback.max_turns),
            max_tool_calls_per_turn: self
                .max_tool_calls_per_turn
                .or(fallback.max_tool_calls_per_turn),
        }
    }
}
