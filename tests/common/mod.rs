#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aria::async_trait;
use aria::chat::{ChatMessage, ChatProvider, ChatResponse, Usage};
use aria::error::LLMError;
use aria::LLMProvider;

#[derive(Debug)]
pub struct Text(pub String);

impl ChatResponse for Text {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn usage(&self) -> Option<Usage> {
        Some(Usage {
            prompt_tokens: 1,
            completion_tokens: 1,
            total_tokens: 2,
        })
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider that replays queued outcomes and records every request.
///
/// Once the queue is empty it answers `reply N`.
#[derive(Default)]
pub struct Scripted {
    outcomes: Mutex<VecDeque<Result<String, LLMError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Scripted {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: Result<String, LLMError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for Scripted {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(messages.to_vec());
            requests.len()
        };
        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(Ok(text)) => Ok(Box::new(Text(text))),
            Some(Err(e)) => Err(e),
            None => Ok(Box::new(Text(format!("reply {n}")))),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

impl LLMProvider for Scripted {}
