//! Conversation-related types.

use carecrew_model::{ModelMessage, ToolCallResult};

/// The messages one agent exchanged with the model for one task.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    pub(crate) fn push(&mut self, msg: ModelMessage, transcript: String) {
        self.items.push(Item { msg, transcript });
    }

    pub(crate) fn push_tool_result(&mut self, id: String, content: String) {
        let transcript = content.clone();
        self.push(ModelMessage::Tool(ToolCallResult { id, content }), transcript);
    }

    pub(crate) fn messages(&self) -> Vec<ModelMessage> {
        self.items.iter().map(|item| item.msg.clone()).collect()
    }

    /// Returns the items in order.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// An item in the conversation.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
}

impl Item {
    /// Returns the transcript of this item.
    ///
    /// The transcript is the plain text of the message. For replayed
    /// provider replies it is the assistant text only.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Whether this item was produced by the model.
    #[inline]
    pub fn is_assistant(&self) -> bool {
        matches!(self.msg, ModelMessage::Assistant(_) | ModelMessage::Opaque(_))
    }
}
