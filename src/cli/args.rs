//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::core::DEFAULT_LOG_PATH;
use crate::pipeline::GenerationParams;

#[derive(Parser, Debug)]
#[command(name = "locallm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Model configuration document (JSON)
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config_path: PathBuf,

    /// File that prompt/response pairs are appended to
    #[arg(short, long, default_value = DEFAULT_LOG_PATH)]
    pub log_file: PathBuf,

    /// Run on CPU even if an accelerator is available
    #[arg(long)]
    pub cpu: bool,

    /// Seed for the sampling RNG
    #[arg(long, default_value_t = GenerationParams::DEFAULT_SEED)]
    pub seed: u64,

    /// Maximum number of new tokens per response
    #[arg(long, default_value_t = GenerationParams::DEFAULT_MAX_NEW_TOKENS)]
    pub max_new_tokens: usize,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigSubcommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommands {
    /// Write a template config file
    Init,
    /// Print config file location
    Where,
}
