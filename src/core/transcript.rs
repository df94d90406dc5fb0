//! Append-only prompt/response log.

use chrono::Local;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_PATH: &str = "/app/responses/model-responses.log";

const SEPARATOR_WIDTH: usize = 50;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub prompt: String,
    pub response: String,
}

impl InteractionRecord {
    #[must_use]
    pub fn now(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            prompt: prompt.into(),
            response: response.into(),
        }
    }
}

impl fmt::Display for InteractionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        writeln!(f)?;
        writeln!(f, "{separator}")?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Prompt: {}", self.prompt)?;
        writeln!(f, "Response: {}", self.response)?;
        writeln!(f, "{separator}")
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
}

impl Transcript {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_parent_dir(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    pub fn log(&self, prompt: &str, response: &str) -> io::Result<()> {
        self.append(&InteractionRecord::now(prompt, response))
    }

    pub fn append(&self, record: &InteractionRecord) -> io::Result<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{record}")?;

        tracing::debug!(path = %self.path.display(), "Appended interaction record");
        Ok(())
    }
}
