use std::collections::VecDeque;

use super::{GenerationError, TextGenerator};

/// Scripted generator that replays queued outcomes and records prompts.
#[derive(Debug)]
pub struct MockGenerator {
    name: String,
    model: String,
    responses: VecDeque<Result<String, GenerationError>>,
    request_history: Vec<String>,
    reclaim_count: usize,
}

impl MockGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            model: "mock-model".to_string(),
            responses: VecDeque::new(),
            request_history: Vec::new(),
            reclaim_count: 0,
        }
    }

    #[must_use]
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.responses.push_back(Ok(text.into()));
        self
    }

    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.responses.push_back(Err(GenerationError::Backend(message.into())));
        self
    }

    #[must_use]
    pub fn request_history(&self) -> &[String] {
        &self.request_history
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_history.len()
    }

    #[must_use]
    pub const fn reclaim_count(&self) -> usize {
        self.reclaim_count
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&mut self, prompt: &str) -> Result<String, GenerationError> {
        self.request_history.push(prompt.to_string());
        self.responses.pop_front().unwrap_or_else(|| {
            Err(GenerationError::Backend(
                "MockGenerator: No responses queued".to_string(),
            ))
        })
    }

    fn reclaim(&mut self) {
        self.reclaim_count += 1;
    }
}
