mod builder;

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use tracing::Instrument;

use crate::conversation::Conversation;
use crate::executor::{self, Assignment};
use crate::model_client::ModelClient;
use crate::role::{AgentRole, TaskSpec};
use crate::tool::Manager as ToolManager;
use crate::{Error, interpolate};
pub use builder::CrewBuilder;

const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

/// A validated crew, ready to be kicked off any number of times.
///
/// Kickoffs share nothing but the immutable definition, so one crew can
/// serve concurrent callers.
pub struct Crew {
    model_client: ModelClient,
    tools: ToolManager,
    agents: Vec<AgentRole>,
    tasks: Vec<(TaskSpec, usize)>,
}

impl Crew {
    /// Runs every task in order and returns their outputs.
    ///
    /// All templates are filled before the first model call, so a missing
    /// input fails without spending any tokens. The first model failure
    /// aborts the kickoff; nothing is retried.
    pub async fn kickoff(
        &self,
        inputs: &BTreeMap<String, String>,
    ) -> Result<CrewOutput, Error> {
        let mut prepared = Vec::with_capacity(self.tasks.len());
        for (task, agent_idx) in &self.tasks {
            let description = interpolate(&task.description, inputs)?;
            let expected_output = interpolate(&task.expected_output, inputs)?;
            prepared.push((description, expected_output, *agent_idx));
        }

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(prepared.len());
        for (idx, (description, expected_output, agent_idx)) in
            prepared.into_iter().enumerate()
        {
            let role = &self.agents[agent_idx];
            let context = (!outputs.is_empty()).then(|| {
                outputs
                    .iter()
                    .map(|output| output.raw.as_str())
                    .collect::<Vec<_>>()
                    .join(CONTEXT_SEPARATOR)
            });

            info!("task {} started by {}", idx + 1, role.role);
            let assignment = Assignment {
                role,
                description: &description,
                expected_output: &expected_output,
                context,
            };
            let outcome =
                executor::execute(&self.model_client, &self.tools, assignment)
                    .instrument(info_span!("task", index = idx + 1))
                    .await?;
            info!(
                "task {} finished with {} characters",
                idx + 1,
                outcome.answer.len()
            );

            outputs.push(TaskOutput {
                agent: role.role.clone(),
                description,
                expected_output,
                raw: outcome.answer,
                conversation: outcome.conversation,
            });
        }

        let raw = outputs
            .last()
            .map(|output| output.raw.clone())
            .unwrap_or_default();
        Ok(CrewOutput {
            tasks: outputs,
            raw,
        })
    }
}

/// What one task produced.
#[derive(Clone, Debug)]
pub struct TaskOutput {
    /// Role of the agent that did the task.
    pub agent: String,
    /// The filled task description.
    pub description: String,
    /// The filled expected output description.
    pub expected_output: String,
    /// The agent's final answer.
    pub raw: String,
    /// Everything exchanged with the model for this task.
    pub conversation: Conversation,
}

/// The result of a kickoff.
#[derive(Clone, Debug)]
pub struct CrewOutput {
    /// Per-task outputs, in execution order.
    pub tasks: Vec<TaskOutput>,
    /// The final answer of the last task.
    pub raw: String,
}

impl Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
