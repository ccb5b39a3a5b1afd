//! A deterministic, queue-driven adapter for tests.

use crate::traits::{ModelAdapter, StructuredRequest, TextRequest};
use cp_domain::{Error, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

enum Canned {
    Text(String),
    Structured(Value),
}

/// A `ModelAdapter` that returns pre-programmed responses in order,
/// recording every request it receives. Intended for `cp-graph` and
/// `cp-runner` scenario tests that need deterministic node behavior
/// without a live endpoint.
#[derive(Default)]
pub struct MockModelAdapter {
    queue: Mutex<VecDeque<Canned>>,
    text_requests: Mutex<Vec<TextRequest>>,
    structured_requests: Mutex<Vec<StructuredRequest>>,
}

impl MockModelAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, response: impl Into<String>) -> &Self {
        self.queue.lock().push_back(Canned::Text(response.into()));
        self
    }

    pub fn push_structured(&self, response: Value) -> &Self {
        self.queue.lock().push_back(Canned::Structured(response));
        self
    }

    pub fn text_request_count(&self) -> usize {
        self.text_requests.lock().len()
    }

    pub fn structured_request_count(&self) -> usize {
        self.structured_requests.lock().len()
    }
}

#[async_trait::async_trait]
impl ModelAdapter for MockModelAdapter {
    async fn generate_text(&self, req: TextRequest) -> Result<String> {
        self.text_requests.lock().push(req);
        match self.queue.lock().pop_front() {
            Some(Canned::Text(s)) => Ok(s),
            Some(Canned::Structured(_)) => Err(Error::Other(
                "MockModelAdapter: next queued response is structured, not text".into(),
            )),
            None => Err(Error::Other("MockModelAdapter: response queue exhausted".into())),
        }
    }

    async fn generate_structured(&self, req: StructuredRequest) -> Result<Value> {
        self.structured_requests.lock().push(req);
        match self.queue.lock().pop_front() {
            Some(Canned::Structured(v)) => Ok(v),
            Some(Canned::Text(_)) => Err(Error::Other(
                "MockModelAdapter: next queued response is text, not structured".into(),
            )),
            None => Err(Error::Other("MockModelAdapter: response queue exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_domain::schema::{FieldType, OutputSchema, SchemaField};

    #[tokio::test]
    async fn returns_canned_responses_in_order() {
        let mock = MockModelAdapter::new();
        mock.push_structured(serde_json::json!({"needs_tool": false}));
        mock.push_text("final answer");

        let schema = OutputSchema::new("t").field(
            "needs_tool",
            SchemaField::new(FieldType::Boolean),
            true,
        );
        let structured = mock
            .generate_structured(StructuredRequest {
                system_prompt: "s".into(),
                user_prompt: "u".into(),
                schema,
                temperature: 0.0,
            })
            .await
            .unwrap();
        assert_eq!(structured["needs_tool"], serde_json::json!(false));

        let text = mock
            .generate_text(TextRequest {
                system_prompt: "s".into(),
                user_prompt: "u".into(),
                temperature: 0.5,
                max_tokens: 256,
                assistant_prefix: None,
            })
            .await
            .unwrap();
        assert_eq!(text, "final answer");

        assert_eq!(mock.structured_request_count(), 1);
        assert_eq!(mock.text_request_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_queue_is_an_error() {
        let mock = MockModelAdapter::new();
        let result = mock
            .generate_text(TextRequest {
                system_prompt: "s".into(),
                user_prompt: "u".into(),
                temperature: 0.0,
                max_tokens: 10,
                assistant_prefix: None,
            })
            .await;
        assert!(result.is_err());
    }
}
