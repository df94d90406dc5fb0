use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while materializing the tokenizer, weights, or pipeline.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Hub download failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid model metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Tensor backend error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Invalid weight file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("No safetensors weights found in {}", .0.display())]
    NoWeights(PathBuf),
}

/// Failure of a single generation call. The loop reports it and carries on.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Tensor backend error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("{0}")]
    Backend(String),
}
