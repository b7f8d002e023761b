use carecrew_model::{ModelMessage, ModelRequest};

use crate::conversation::Conversation;
use crate::model_client::ModelClient;
use crate::role::AgentRole;
use crate::tool::Manager as ToolManager;
use crate::Error;

const FORCE_FINAL_ANSWER: &str = "You have used all the tool calls you are \
allowed for this task. Do not call any more tools; give your best complete \
final answer now, based on what you have gathered so far.";

/// One task, ready to run: templates filled, context collected.
pub(crate) struct Assignment<'a> {
    pub role: &'a AgentRole,
    pub description: &'a str,
    pub expected_output: &'a str,
    pub context: Option<String>,
}

pub(crate) struct Outcome {
    pub answer: String,
    pub conversation: Conversation,
}

/// Runs the agent loop for one task until the model answers in text.
pub(crate) async fn execute(
    model_client: &ModelClient,
    tools: &ToolManager,
    assignment: Assignment<'_>,
) -> Result<Outcome, Error> {
    let role = assignment.role;
    let mut conversation = Conversation::default();
    let system_prompt = role.system_prompt();
    conversation.push(ModelMessage::System(system_prompt.clone()), system_prompt);
    let user_prompt = task_prompt(&assignment);
    conversation.push(ModelMessage::User(user_prompt.clone()), user_prompt);

    let tool_defs = tools.definitions(&role.tools);
    let mut rounds = 0;
    loop {
        let offer_tools = !tool_defs.is_empty() && rounds < role.max_iterations;
        let request = ModelRequest {
            messages: conversation.messages(),
            tools: if offer_tools { tool_defs.clone() } else { vec![] },
        };
        let resp = model_client
            .send_request(request)
            .await
            .map_err(|err| Error::model(&format!("acting as {}", role.role), err))?;

        let msg = match resp.opaque_msg {
            Some(opaque) => ModelMessage::Opaque(opaque),
            // Downgrade to a text-only message.
            None => ModelMessage::Assistant(resp.transcript.clone()),
        };
        conversation.push(msg, resp.transcript.clone());

        if resp.tool_calls.is_empty() || !offer_tools {
            return Ok(Outcome {
                answer: resp.transcript,
                conversation,
            });
        }

        rounds += 1;
        debug!(round = rounds, calls = resp.tool_calls.len(), "running tools");
        for call in resp.tool_calls {
            let id = call.id.clone();
            let content = match tools.execute(call, &role.tools).await {
                Ok(content) => content,
                Err(err) => {
                    debug!("tool call {id} failed: {err}");
                    format!("Error: {}", err.reason())
                }
            };
            conversation.push_tool_result(id, content);
        }

        if rounds >= role.max_iterations {
            info!("tool budget of {} rounds used up", role.max_iterations);
            conversation.push(
                ModelMessage::User(FORCE_FINAL_ANSWER.to_owned()),
                FORCE_FINAL_ANSWER.to_owned(),
            );
        }
    }
}

fn task_prompt(assignment: &Assignment<'_>) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final \
         answer: {}\nYou MUST return the actual complete content as the \
         final answer, not a summary.",
        assignment.description, assignment.expected_output
    );
    if let Some(context) = &assignment.context {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }
    prompt.push_str(
        "\n\nBegin! This is VERY important to you, use the tools available \
         and give your best Final Answer, your job depends on it!",
    );
    prompt
}
