use carecrew_model::ModelProvider;

use super::Crew;
use crate::model_client::ModelClient;
use crate::role::{AgentRole, TaskSpec};
use crate::tool::{Manager as ToolManager, Tool};
use crate::Error;

/// [`Crew`] builder.
pub struct CrewBuilder {
    model_client: ModelClient,
    tools: ToolManager,
    agents: Vec<AgentRole>,
    tasks: Vec<TaskSpec>,
}

impl CrewBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: ToolManager::default(),
            agents: vec![],
            tasks: vec![],
        }
    }

    /// Registers a tool that agents can be granted.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Adds a crew member.
    #[inline]
    pub fn with_agent(mut self, agent: AgentRole) -> Self {
        self.agents.push(agent);
        self
    }

    /// Appends a task; tasks run in the order they are added.
    #[inline]
    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Checks the definition and builds the crew.
    pub fn build(self) -> Result<Crew, Error> {
        let Self {
            model_client,
            tools,
            agents,
            tasks,
        } = self;

        if tasks.is_empty() {
            return Err(Error::invalid_crew("a crew needs at least one task"));
        }
        for (idx, agent) in agents.iter().enumerate() {
            if agents[..idx].iter().any(|other| other.role == agent.role) {
                return Err(Error::invalid_crew(format!(
                    "agent role `{}` is defined twice",
                    agent.role
                )));
            }
            if let Some(tool) = agent.tools.iter().find(|t| !tools.contains(t)) {
                return Err(Error::invalid_crew(format!(
                    "agent `{}` uses unregistered tool `{tool}`",
                    agent.role
                )));
            }
        }

        let mut resolved = Vec::with_capacity(tasks.len());
        for task in tasks {
            let Some(agent_idx) =
                agents.iter().position(|agent| agent.role == task.agent)
            else {
                return Err(Error::invalid_crew(format!(
                    "task refers to unknown agent `{}`",
                    task.agent
                )));
            };
            resolved.push((task, agent_idx));
        }

        Ok(Crew {
            model_client,
            tools,
            agents,
            tasks: resolved,
        })
    }
}
