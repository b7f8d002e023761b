use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use carecrew_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{ChatCompletionChunk, FunctionToolCall, Message, ToolCall};

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type SseStep = (Result<Option<String>, SseError>, Sse);

/// Folds streamed chunks into events and the final assistant message.
#[derive(Default)]
struct Accumulator {
    id: Option<String>,
    content: String,
    reasoning_content: Option<String>,
    tool_calls: Vec<ToolCall>,
    completed: bool,
}

impl Accumulator {
    fn apply(
        &mut self,
        mut chunk: ChatCompletionChunk,
        out: &mut VecDeque<ModelResponseEvent>,
    ) -> Result<(), Error> {
        if self.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id {
            return Err(Error::new(
                "chunk id mismatch",
                ErrorKind::InvalidResponse,
            ));
        }

        // Only one choice is ever requested. Usage-only chunks have none.
        let Some(choice) = chunk.choices.pop() else {
            return Ok(());
        };

        if let Some(reasoning) = choice.delta.reasoning_content {
            self.reasoning_content
                .get_or_insert_default()
                .push_str(&reasoning);
        }
        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                self.content.push_str(&content);
                out.push_back(ModelResponseEvent::MessageDelta(content));
            }
        }
        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            self.merge_tool_call(fragment);
        }

        if let Some(reason) = choice.finish_reason {
            let reason = match reason.as_str() {
                "tool_calls" => ModelFinishReason::ToolCalls,
                "length" => ModelFinishReason::Length,
                _ => ModelFinishReason::Stop,
            };
            self.complete(reason, out);
        }
        Ok(())
    }

    fn merge_tool_call(&mut self, fragment: ToolCall) {
        let Some(call) = self
            .tool_calls
            .iter_mut()
            .find(|call| call.index == fragment.index)
        else {
            self.tool_calls.push(fragment);
            return;
        };
        if let Some(id) = fragment.id {
            call.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = fragment.r#type {
            // The type is repeated in some fragments rather than split.
            call.r#type = Some(ty);
        }
        if let Some(function) = fragment.function {
            let target = call.function.get_or_insert_with(FunctionToolCall::default);
            if let Some(name) = function.name {
                target.name.get_or_insert_default().push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                target.arguments.get_or_insert_default().push_str(&arguments);
            }
        }
    }

    /// Emits the reassembled tool calls followed by the completion event.
    fn complete(
        &mut self,
        reason: ModelFinishReason,
        out: &mut VecDeque<ModelResponseEvent>,
    ) {
        if self.completed {
            return;
        }
        self.completed = true;
        for call in &self.tool_calls {
            out.push_back(ModelResponseEvent::ToolCall(to_request(call)));
        }
        out.push_back(ModelResponseEvent::Completed(reason));
    }

    fn finish(self) -> Option<(String, Message)> {
        let tool_calls: Vec<_> = self
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                index: None,
                r#type: call.r#type.or_else(|| Some("function".to_owned())),
                ..call
            })
            .collect();
        Some((
            self.id?,
            Message::Assistant {
                content: Some(self.content),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                reasoning_content: self.reasoning_content,
            },
        ))
    }
}

fn to_request(call: &ToolCall) -> ToolCallRequest {
    let function = call.function.as_ref();
    let arguments = function
        .and_then(|f| f.arguments.as_deref())
        .filter(|args| !args.trim().is_empty())
        .map(|args| {
            // Broken JSON is passed on as a string so the tool can reject
            // it with a readable message instead of silently getting `{}`.
            serde_json::from_str::<Value>(args)
                .unwrap_or_else(|_| Value::String(args.to_owned()))
        })
        .unwrap_or_else(|| Value::Object(Default::default()));
    ToolCallRequest {
        id: call.id.clone().unwrap_or_default(),
        name: function.and_then(|f| f.name.clone()).unwrap_or_default(),
        arguments,
    }
}

fn read_next(mut sse: Sse) -> PinnedFuture<SseStep> {
    Box::pin(async move {
        let result = sse.next_event().await;
        (result, sse)
    })
}

/// A streamed chat completion.
pub struct OpenAIResponse {
    next_step: Option<PinnedFuture<SseStep>>,
    pending: VecDeque<ModelResponseEvent>,
    acc: Accumulator,
    full_msg: Option<(String, Message)>,
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        Self {
            next_step: Some(read_next(sse)),
            pending: VecDeque::new(),
            acc: Accumulator::default(),
            full_msg: None,
        }
    }

    fn end_of_stream(&mut self) {
        // Some compatible servers close the stream without a finish reason.
        let reason = if self.acc.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        };
        self.acc.complete(reason, &mut self.pending);
        self.full_msg = std::mem::take(&mut self.acc).finish();
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Ok(Some(event)));
            }
            let Some(next_step) = this.next_step.as_mut() else {
                return Poll::Ready(Ok(None));
            };
            let (result, sse) = ready!(next_step.as_mut().poll(cx));
            this.next_step = None;

            let data = match result {
                Ok(Some(data)) if data != "[DONE]" => data,
                Ok(_) => {
                    this.end_of_stream();
                    continue;
                }
                Err(SseError::ChunksError(err)) => {
                    return Poll::Ready(Err(Error::new(
                        err.0,
                        ErrorKind::Transport,
                    )));
                }
                Err(SseError::InvalidPayload) => {
                    return Poll::Ready(Err(Error::new(
                        "malformed event stream",
                        ErrorKind::InvalidResponse,
                    )));
                }
            };
            trace!("got sse event: {data}");

            let chunk = match serde_json::from_str::<ChatCompletionChunk>(&data)
            {
                Ok(chunk) => chunk,
                Err(err) => {
                    return Poll::Ready(Err(Error::new(
                        format!("malformed chunk: {err}"),
                        ErrorKind::InvalidResponse,
                    )));
                }
            };
            if let Err(err) = this.acc.apply(chunk, &mut this.pending) {
                return Poll::Ready(Err(err));
            }

            if this.acc.completed {
                // Anything after the finish reason is usage accounting.
                this.full_msg = std::mem::take(&mut this.acc).finish();
            } else {
                this.next_step = Some(read_next(sse));
            }
        }
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, msg)| OpaqueMessage::new(id, msg.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;

    use super::*;
    use crate::io::Chunks;

    async fn drain(
        chunks: Vec<Bytes>,
    ) -> (Vec<ModelResponseEvent>, Option<OpaqueMessage>) {
        let sse = Sse::new(Chunks::from_vec_deque(chunks.into()));
        let mut resp = pin!(OpenAIResponse::from_sse(sse));
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            events.push(event);
        }
        (events, resp.make_opaque_message())
    }

    #[tokio::test]
    async fn test_tool_call_stream() {
        let (events, opaque) = drain(vec![Bytes::from_static(include_bytes!(
            "../fixtures/tool_call_stream.txt"
        ))])
        .await;

        let text: String = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::MessageDelta(delta) => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Let me search for that.");

        let calls: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].name, "search_the_internet_with_serper");
        assert_eq!(calls[0].arguments["search_query"], "fever cough diabetes");
        assert_eq!(calls[1].name, "read_website_content");
        assert_eq!(calls[1].arguments["website_url"], "https://www.cdc.gov/flu");

        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::ToolCalls))
        );

        let opaque = opaque.unwrap();
        assert_eq!(opaque.id(), "chatcmpl-42");
        let Some(Message::Assistant { tool_calls, .. }) =
            opaque.to_raw::<Message>()
        else {
            panic!("expected an assistant message");
        };
        let tool_calls = tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls[0].index, None);
        assert_eq!(tool_calls[0].r#type.as_deref(), Some("function"));
    }

    #[tokio::test]
    async fn test_stream_without_finish_reason() {
        let (events, opaque) = drain(vec![
            Bytes::from_static(
                br#"data: {"id":"c1","choices":[{"delta":{"content":"Rest "},"finish_reason":null}]}

"#,
            ),
            Bytes::from_static(
                br#"data: {"id":"c1","choices":[{"delta":{"content":"and fluids."},"finish_reason":null}]}

"#,
            ),
        ])
        .await;
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Rest ".to_owned()),
                ModelResponseEvent::MessageDelta("and fluids.".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
        assert_eq!(opaque.unwrap().id(), "c1");
    }

    #[tokio::test]
    async fn test_chunk_id_mismatch() {
        let sse = Sse::new(Chunks::from_vec_deque(
            vec![Bytes::from_static(
                br#"data: {"id":"c1","choices":[{"delta":{"content":"a"},"finish_reason":null}]}

data: {"id":"c2","choices":[{"delta":{"content":"b"},"finish_reason":null}]}

"#,
            )]
            .into(),
        ));
        let mut resp = pin!(OpenAIResponse::from_sse(sse));
        let first = poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await;
        assert!(matches!(first, Ok(Some(_))));
        let err = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidResponse);
    }
}
