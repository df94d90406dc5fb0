//! Candle-backed text-generation pipeline for Llama-family checkpoints.

use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaEosToks};
use tokenizers::Tokenizer;

use super::{GenerationError, GenerationParams, TextGenerator};

pub struct CausalLmPipeline {
    model_id: String,
    model: Llama,
    config: Config,
    tokenizer: Tokenizer,
    device: Device,
    dtype: DType,
    params: GenerationParams,
    logits_processor: LogitsProcessor,
}

impl CausalLmPipeline {
    #[must_use]
    pub fn new(
        model_id: impl Into<String>,
        model: Llama,
        config: Config,
        tokenizer: Tokenizer,
        device: Device,
        dtype: DType,
        params: GenerationParams,
    ) -> Self {
        let logits_processor = LogitsProcessor::from_sampling(params.seed, params.sampling());
        Self {
            model_id: model_id.into(),
            model,
            config,
            tokenizer,
            device,
            dtype,
            params,
            logits_processor,
        }
    }

    fn is_eos(&self, token: u32) -> bool {
        match &self.config.eos_token_id {
            Some(LlamaEosToks::Single(id)) => *id == token,
            Some(LlamaEosToks::Multiple(ids)) => ids.contains(&token),
            None => false,
        }
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, GenerationError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, GenerationError> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))
    }

    fn sample_continuation(&mut self, prompt_ids: &[u32]) -> Result<Vec<u32>, GenerationError> {
        let budget = self
            .params
            .token_budget(prompt_ids.len(), self.config.max_position_embeddings);
        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let mut tokens = prompt_ids.to_vec();
        let mut index_pos = 0;

        for step in 0..budget {
            let context_len = if step == 0 { tokens.len() } else { 1 };
            let context = &tokens[tokens.len() - context_len..];
            let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;

            let logits = self
                .model
                .forward(&input, index_pos, &mut cache)?
                .squeeze(0)?
                .to_dtype(DType::F32)?;
            let logits = if self.params.applies_repeat_penalty() {
                candle_transformers::utils::apply_repeat_penalty(
                    &logits,
                    self.params.repetition_penalty,
                    &tokens,
                )?
            } else {
                logits
            };
            index_pos += context_len;

            let next_token = self.logits_processor.sample(&logits)?;
            if self.is_eos(next_token) {
                break;
            }
            tokens.push(next_token);
        }

        Ok(tokens.split_off(prompt_ids.len()))
    }
}

/// Strips the decoded prompt from the decoded full sequence, keeping the
/// spacing at the join. `None` when the lengths do not line up on a char.
fn continuation_text<'a>(full: &'a str, decoded_prompt: &str) -> Option<&'a str> {
    full.strip_prefix(decoded_prompt)
        .or_else(|| full.get(decoded_prompt.len()..))
}

/// Prompt followed by its continuation; decodes the new tokens alone when the
/// full sequence cannot be split at the prompt.
fn join_response(
    prompt: &str,
    full: &str,
    decoded_prompt: &str,
    decode_generated: impl FnOnce() -> Result<String, GenerationError>,
) -> Result<String, GenerationError> {
    let continuation = match continuation_text(full, decoded_prompt) {
        Some(text) => text.to_string(),
        None => decode_generated()?,
    };
    Ok(format!("{prompt}{continuation}"))
}

impl TextGenerator for CausalLmPipeline {
    fn name(&self) -> &'static str {
        "candle"
    }

    fn model(&self) -> &str {
        &self.model_id
    }

    fn generate(&mut self, prompt: &str) -> Result<String, GenerationError> {
        let prompt_ids = self.encode(prompt)?;
        if prompt_ids.is_empty() {
            return Err(GenerationError::Backend("prompt produced no tokens".to_string()));
        }

        let generated = self.sample_continuation(&prompt_ids)?;
        tracing::debug!(
            prompt_tokens = prompt_ids.len(),
            generated_tokens = generated.len(),
            "Generation finished"
        );

        let decoded_prompt = self.decode(&prompt_ids)?;
        let mut all_ids = prompt_ids;
        all_ids.extend_from_slice(&generated);
        let full = self.decode(&all_ids)?;

        join_response(prompt, &full, &decoded_prompt, || self.decode(&generated))
    }

    fn reclaim(&mut self) {
        if self.device.is_cpu() {
            return;
        }
        if let Err(e) = self.device.synchronize() {
            tracing::warn!("Device synchronize failed: {e}");
        }
    }
}
