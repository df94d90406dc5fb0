pub mod causal_lm;
pub mod error;
pub mod loader;
pub mod mock;

use candle_transformers::generation::Sampling;

pub use causal_lm::CausalLmPipeline;
pub use error::{GenerationError, LoadError};
pub use loader::{LoadStep, ModelLoader, ModelSource};
pub use mock::MockGenerator;

/// A bound tokenizer + model exposing "generate text from prompt".
pub trait TextGenerator {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    /// Returns the full text: the prompt followed by the generated continuation.
    fn generate(&mut self, prompt: &str) -> Result<String, GenerationError>;

    /// Best-effort release of per-turn resources.
    fn reclaim(&mut self) {}
}

/// Sampling parameters, passed through from the configuration unchecked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub max_new_tokens: Option<usize>,
    pub temperature: f64,
    pub top_p: f64,
    pub repetition_penalty: f32,
    pub seed: u64,
}

impl GenerationParams {
    pub const DEFAULT_MAX_NEW_TOKENS: usize = 128;
    pub const DEFAULT_SEED: u64 = 299_792_458;

    /// Number of tokens to generate for a prompt of `prompt_len` tokens.
    ///
    /// `max_new_tokens` takes precedence over `max_length`; both are capped by
    /// the model's context window.
    #[must_use]
    pub fn token_budget(&self, prompt_len: usize, context_limit: usize) -> usize {
        let requested = self
            .max_new_tokens
            .unwrap_or_else(|| self.max_length.saturating_sub(prompt_len));
        requested.min(context_limit.saturating_sub(prompt_len))
    }

    #[must_use]
    pub fn sampling(&self) -> Sampling {
        let temperature = self.temperature;
        if temperature <= 0.0 {
            Sampling::ArgMax
        } else if self.top_p >= 1.0 {
            Sampling::All { temperature }
        } else {
            Sampling::TopP {
                p: self.top_p,
                temperature,
            }
        }
    }

    #[must_use]
    pub fn applies_repeat_penalty(&self) -> bool {
        (self.repetition_penalty - 1.0).abs() > f32::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams {
            max_length: 50,
            max_new_tokens: None,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.1,
            seed: 1,
        }
    }

    #[test]
    fn test_budget_from_max_length() {
        assert_eq!(params().token_budget(10, 2048), 40);
        assert_eq!(params().token_budget(60, 2048), 0);
    }

    #[test]
    fn test_max_new_tokens_takes_precedence() {
        let p = GenerationParams {
            max_new_tokens: Some(128),
            ..params()
        };
        assert_eq!(p.token_budget(10, 2048), 128);
    }

    #[test]
    fn test_budget_capped_by_context() {
        let p = GenerationParams {
            max_new_tokens: Some(128),
            ..params()
        };
        assert_eq!(p.token_budget(2000, 2048), 48);
    }

    #[test]
    fn test_sampling_selection() {
        let Sampling::TopP { p, temperature } = params().sampling() else {
            panic!("Expected TopP sampling");
        };
        assert!((p - 0.9).abs() < f64::EPSILON);
        assert!((temperature - 0.7).abs() < f64::EPSILON);

        let greedy = GenerationParams {
            temperature: 0.0,
            ..params()
        };
        assert!(matches!(greedy.sampling(), Sampling::ArgMax));

        let full = GenerationParams {
            top_p: 1.0,
            ..params()
        };
        assert!(matches!(full.sampling(), Sampling::All { .. }));
    }

    #[test]
    fn test_repeat_penalty_neutral_value() {
        assert!(params().applies_repeat_penalty());
        let neutral = GenerationParams {
            repetition_penalty: 1.0,
            ..params()
        };
        assert!(!neutral.applies_repeat_penalty());
    }
}
