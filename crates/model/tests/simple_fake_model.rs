use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{self, Poll};

use carecrew_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "echo failed: {}", self.0)
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Answers with the last user message, one word per event.
struct EchoResponse {
    words: VecDeque<String>,
    finished: bool,
}

impl ModelResponse for EchoResponse {
    type Error = EchoError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if let Some(word) = this.words.pop_front() {
            return Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(
                word,
            ))));
        }
        if !this.finished {
            this.finished = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            ))));
        }
        Poll::Ready(Ok(None))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.clone()),
            _ => None,
        });
        let result = match last_user {
            Some(text) => {
                let mut words = VecDeque::new();
                for (idx, word) in text.split(' ').enumerate() {
                    let prefix = if idx == 0 { "" } else { " " };
                    words.push_back(format!("{prefix}{word}"));
                }
                Ok(EchoResponse {
                    words,
                    finished: false,
                })
            }
            None => Err(EchoError(ErrorKind::InvalidResponse)),
        };
        ready(result)
    }
}

#[tokio::test]
async fn test_streamed_text() {
    let req = ModelRequest {
        messages: vec![
            ModelMessage::System("You are a Medical Diagnostician.".to_owned()),
            ModelMessage::User("fever and cough".to_owned()),
        ],
        tools: vec![],
    };
    let mut resp = EchoProvider.send_request(&req).await.unwrap();

    let mut text = String::new();
    let mut finish = None;
    while let Some(event) =
        poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
            .await
            .unwrap()
    {
        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::Completed(reason) => finish = Some(reason),
            ModelResponseEvent::ToolCall(req) => {
                unreachable!("unexpected tool call: {req:?}")
            }
        }
    }

    assert_eq!(text, "fever and cough");
    assert_eq!(finish, Some(ModelFinishReason::Stop));
    assert!(resp.make_opaque_message().is_none());
}

#[tokio::test]
async fn test_error_kind() {
    let result = EchoProvider.send_request(&ModelRequest::default()).await;
    let err = result.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert_eq!(err.to_string(), "echo failed: invalid response");
}
