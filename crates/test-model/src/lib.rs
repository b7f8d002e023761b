//! A scripted fake model for tests.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use carecrew_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, OpaqueMessage,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

enum ScriptStep {
    Reply(PresetResponse),
    Fail(&'static str, ErrorKind),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<ScriptStep>,
    requests: Vec<ModelRequest>,
    replies_sent: usize,
}

/// A local fake model for testing purpose.
///
/// Replies are queued up front and handed out in order, one per request,
/// no matter what the request contains. Every request is recorded so tests
/// can inspect what the caller actually sent. Clones share the same script.
///
/// Running out of replies is reported as an error.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Queues a reply.
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.lock().steps.push_back(ScriptStep::Reply(preset));
    }

    /// Queues a failed request.
    #[inline]
    pub fn add_failure(&self, message: &'static str, kind: ErrorKind) {
        self.lock().steps.push_back(ScriptStep::Fail(message, kind));
    }

    /// Sets the delay between two streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Number of queued steps not consumed yet.
    pub fn remaining(&self) -> usize {
        self.lock().steps.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A poisoned script only happens after a test already panicked.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.lock();
        script.requests.push(req.clone());
        let result = match script.steps.pop_front() {
            Some(ScriptStep::Reply(preset)) => {
                script.replies_sent += 1;
                Ok(TestModelResponse {
                    id: format!("test:{}", script.replies_sent),
                    events: preset.events.clone().into(),
                    finish_reason: Some(finish_reason(&preset)),
                    preset,
                    delay: self.delay.unwrap_or(Duration::from_millis(1)),
                    sleep: None,
                })
            }
            Some(ScriptStep::Fail(message, kind)) => Err(Error { message, kind }),
            None => Err(Error {
                message: "no more scripted replies",
                kind: ErrorKind::RateLimitExceeded,
            }),
        };
        ready(result)
    }
}

pub struct TestModelResponse {
    id: String,
    preset: PresetResponse,
    events: VecDeque<PresetEvent>,
    finish_reason: Option<ModelFinishReason>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        if let Some(event) = this.events.pop_front() {
            let event = match event {
                PresetEvent::MessageDelta(delta) => {
                    ModelResponseEvent::MessageDelta(delta)
                }
                PresetEvent::ToolCall(req) => ModelResponseEvent::ToolCall(req),
            };
            return Poll::Ready(Ok(Some(event)));
        }
        if let Some(reason) = this.finish_reason.take() {
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(reason))));
        }
        Poll::Ready(Ok(None))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        Some(OpaqueMessage::new(&self.id, self.preset.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use carecrew_model::{ModelMessage, ToolCallRequest};
    use serde_json::json;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, Vec<ToolCallRequest>, ModelFinishReason, OpaqueMessage) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        let mut tool_calls = vec![];
        let mut finish = None;
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            match event {
                ModelResponseEvent::Completed(reason) => finish = Some(reason),
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
                ModelResponseEvent::ToolCall(req) => tool_calls.push(req),
            }
        }
        (
            msg,
            tool_calls,
            finish.unwrap(),
            resp.make_opaque_message().unwrap(),
        )
    }

    fn user_request(text: &str) -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User(text.to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Let me ".to_owned()),
            PresetEvent::MessageDelta("search.".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "call_1".to_owned(),
                name: "search_the_internet_with_serper".to_owned(),
                arguments: json!({ "search_query": "fever cough" }),
            }),
        ]));
        provider.add_response(PresetResponse::text("Likely flu."));

        let resp = provider.send_request(&user_request("Hi")).await.unwrap();
        let (msg, tool_calls, finish, opaque) = collect_response(resp).await;
        assert_eq!(msg, "Let me search.");
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].arguments["search_query"], "fever cough");
        assert_eq!(finish, ModelFinishReason::ToolCalls);
        assert_eq!(opaque.id(), "test:1");
        assert_eq!(opaque.to_raw::<PresetResponse>().unwrap().events.len(), 3);

        let resp = provider.send_request(&user_request("Go")).await.unwrap();
        let (msg, tool_calls, finish, _) = collect_response(resp).await;
        assert_eq!(msg, "Likely flu.");
        assert!(tool_calls.is_empty());
        assert_eq!(finish, ModelFinishReason::Stop);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], user_request("Go"));
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failures() {
        let provider = TestModelProvider::default();
        provider.add_failure("provider down", ErrorKind::Transport);

        let err = provider
            .send_request(&user_request("Hi"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = provider
            .send_request(&user_request("Hi"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(provider.requests().len(), 2);
    }
}
