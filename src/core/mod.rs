pub mod error;
pub mod system;
pub mod transcript;

pub use error::{AppError, Result};
pub use transcript::{DEFAULT_LOG_PATH, InteractionRecord, Transcript};
