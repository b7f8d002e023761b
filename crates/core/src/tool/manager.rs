use std::collections::BTreeMap;
use std::sync::Arc;

use carecrew_model::{ModelTool, ToolCallRequest};

use crate::tool::object::{ToolFuture, ToolObject, ToolObjectImpl};
use crate::tool::{Error, Tool};

/// The registry of tools shared by every agent of a crew.
#[derive(Default)]
pub struct Manager {
    tools: BTreeMap<String, Arc<dyn ToolObject>>,
}

impl Manager {
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        if self.tools.insert(name.clone(), Arc::new(ToolObjectImpl(tool))).is_some()
        {
            warn!("tool `{name}` registered twice, keeping the last one");
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of the named tools, in the order given.
    pub fn definitions(&self, names: &[String]) -> Vec<ModelTool> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Starts a tool call, restricted to the tools in `allowed`.
    ///
    /// Unknown or disallowed tools resolve to an error result instead of
    /// being skipped, since every call id needs an answer.
    pub fn execute(&self, req: ToolCallRequest, allowed: &[String]) -> ToolFuture {
        let tool = allowed
            .iter()
            .any(|name| *name == req.name)
            .then(|| self.tools.get(&req.name))
            .flatten();
        let Some(tool) = tool else {
            warn!("tool not available: {}", req.name);
            let reason = format!(
                "tool `{}` does not exist, available tools: {}",
                req.name,
                allowed.join(", ")
            );
            return Box::pin(std::future::ready(Err(
                Error::invalid_input().with_reason(reason),
            )));
        };
        trace!("spawning a tool ({}) with args: {:?}", req.id, req.arguments);
        Arc::clone(tool).execute(req.arguments)
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::{ErrorKind, ToolResult};

    static EMPTY_SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Repeats the text"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(input.text))
        }
    }

    fn call(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_execute() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);
        let allowed = vec!["echo".to_owned()];

        let result = manager
            .execute(call("echo", json!({ "text": "hi" })), &allowed)
            .await;
        assert_eq!(result.unwrap(), "hi");

        let err = manager
            .execute(call("echo", json!({ "txt": "hi" })), &allowed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_unavailable_tools() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);

        let err = manager
            .execute(call("read_tool", json!({})), &["echo".to_owned()])
            .await
            .unwrap_err();
        assert!(err.reason().contains("`read_tool` does not exist"));

        // Registered, but not granted to this agent.
        let err = manager
            .execute(call("echo", json!({ "text": "hi" })), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_definitions() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);
        let defs = manager.definitions(&["echo".to_owned(), "nope".to_owned()]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].description, "Repeats the text");
        assert!(manager.contains("echo"));
    }
}
