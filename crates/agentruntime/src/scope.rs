use agentcore::Agent;

/// Run-scoped resource identifier the agents are confined to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceScope {
    id: String,
}

impl ResourceScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn instructions(&self) -> String {
        format!(
            "Resource access for this execution is scoped to `{id}`. \
             Read and write files only inside `{id}` and record every change \
             there so it can be reviewed before it is applied.",
            id = self.id
        )
    }

    /// Copy of `agents` with the scope instructions appended to each prompt
    pub fn contextualize(&self, agents: &[Agent]) -> Vec<Agent> {
        let instructions = self.instructions();
        agents
            .iter()
            .map(|agent| {
                let mut agent = agent.clone();
                agent.system_prompt = if agent.system_prompt.is_empty() {
                    instructions.clone()
                } else {
                    format!("{}\n\n{}", agent.system_prompt, instructions)
                };
                agent
            })
            .collect()
    }

    /// Task text with the scope instructions appended
    pub fn scope_task(&self, task: &str) -> String {
        format!("{}\n\n{}", task, self.instructions())
    }
}
