/// Tool rounds an agent gets per task before it must answer.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// A static description of one crew member.
///
/// The record is turned into the system prompt of every conversation the
/// agent has, and decides which registered tools it is offered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentRole {
    /// Short role name, also used by tasks to refer to the agent.
    pub role: String,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Background that shapes how the agent works.
    pub backstory: String,
    /// Names of the registered tools this agent may call.
    pub tools: Vec<String>,
    /// Tool rounds allowed per task.
    pub max_iterations: usize,
}

impl AgentRole {
    /// Creates a role without tools.
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: vec![],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Grants the agent access to a registered tool.
    #[inline]
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools.push(name.into());
        self
    }

    /// Overrides the tool round budget.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub(crate) fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

/// A static description of one step of the crew.
///
/// `description` and `expected_output` are templates: `{name}` is replaced
/// by the kickoff input called `name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSpec {
    /// What to do.
    pub description: String,
    /// What the answer should look like.
    pub expected_output: String,
    /// The `role` of the agent that performs the task.
    pub agent: String,
}

impl TaskSpec {
    /// Creates a task performed by the agent with the given role.
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
        }
    }
}
