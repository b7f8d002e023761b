use carecrew_model::{ModelMessage, ModelRequest, ModelTool};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// A tool call, either a streamed fragment or the reassembled call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionToolCall>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub reasoning_content: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning_content: Option<String>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

// -----------
// Conversions
// -----------

pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        stream: true,
    }
}

fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: Some(content.clone()),
            tool_calls: None,
            reasoning_content: None,
        },
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
        ModelMessage::Opaque(opaque) => match opaque.to_raw::<Message>() {
            Some(msg) => msg.clone(),
            // Replies from other providers carry nothing we can replay.
            None => Message::Assistant {
                content: None,
                tool_calls: None,
                reasoning_content: None,
            },
        },
    }
}

fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use carecrew_model::{OpaqueMessage, ToolCallResult};
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a Treatment Advisor.".to_owned()),
                ModelMessage::User("Recommend a plan.".to_owned()),
            ],
            tools: vec![ModelTool {
                name: "read_website_content".to_owned(),
                description: "Reads a web page.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "website_url": { "type": "string" } }
                }),
            }],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_temperature(0.1)
            .with_max_tokens(8000)
            .build();

        let mut body = serde_json::to_value(create_request(&request, &config))
            .unwrap();
        let temperature =
            body.as_object_mut().unwrap().remove("temperature").unwrap();
        assert!((temperature.as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(
            body,
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "You are a Treatment Advisor." },
                    { "role": "user", "content": "Recommend a plan." }
                ],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "read_website_content",
                        "description": "Reads a web page.",
                        "parameters": {
                            "type": "object",
                            "properties": { "website_url": { "type": "string" } }
                        }
                    }
                }],
                "max_tokens": 8000,
                "stream": true
            })
        );
    }

    #[test]
    fn test_history_replay() {
        let reply = Message::Assistant {
            content: None,
            tool_calls: Some(vec![ToolCall {
                index: None,
                id: Some("call_1".to_owned()),
                r#type: Some("function".to_owned()),
                function: Some(FunctionToolCall {
                    name: Some("read_website_content".to_owned()),
                    arguments: Some(r#"{"website_url":"https://a.b"}"#.to_owned()),
                }),
            }]),
            reasoning_content: None,
        };
        let request = ModelRequest {
            messages: vec![
                ModelMessage::Opaque(OpaqueMessage::new("chatcmpl-1", reply)),
                ModelMessage::Tool(ToolCallResult {
                    id: "call_1".to_owned(),
                    content: "page text".to_owned(),
                }),
                ModelMessage::Opaque(OpaqueMessage::new("foreign", 42u32)),
            ],
            tools: vec![],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();

        let body = serde_json::to_value(create_request(&request, &config))
            .unwrap();
        let messages = &body["messages"];
        assert_eq!(messages[0]["role"], "assistant");
        assert_eq!(messages[0]["tool_calls"][0]["id"], "call_1");
        assert!(messages[0]["tool_calls"][0].get("index").is_none());
        assert_eq!(messages[1]["tool_call_id"], "call_1");
        assert_eq!(messages[2], json!({ "role": "assistant", "content": null }));
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }
}
