use std::io;
use std::path::Path;

use clap::Parser;
use tracing::Instrument;
use uuid::Uuid;

use locallm::cli::{Cli, Commands, ConfigSubcommands};
use locallm::config::ModelConfig;
use locallm::core::{Result, Transcript, system};
use locallm::logging;
use locallm::pipeline::loader::device_label;
use locallm::pipeline::{CausalLmPipeline, LoadStep, ModelLoader, TextGenerator};
use locallm::repl::{self, Repl};

fn run_config_command(config_path: &Path, command: &ConfigSubcommands) {
    match command {
        ConfigSubcommands::Init => match ModelConfig::init_template(config_path) {
            Ok(path) => println!("✓ Created config file at {}", path.display()),
            Err(e) => eprintln!("✗ Failed to create config: {e}"),
        },
        ConfigSubcommands::Where => match ModelConfig::resolve_path(config_path) {
            Ok(path) => println!("{}", path.display()),
            Err(e) => eprintln!("✗ Could not determine config path: {e}"),
        },
    }
}

fn start(cli: &Cli) -> Result<(CausalLmPipeline, Transcript)> {
    println!("Loading configuration...");
    let config = ModelConfig::load(&cli.config_path)?;
    let params = config.generation_params(Some(cli.max_new_tokens), cli.seed);
    let device = ModelLoader::select_device(cli.cpu)?;

    println!("\nSystem Info:");
    println!("{}", system::version_line());
    println!("Device: {}", device_label(&device));
    println!("{}", system::memory_report());

    let transcript = Transcript::new(&cli.log_file);
    transcript.ensure_parent_dir()?;

    let pipeline = ModelLoader::new(device).load(&config, params, |step| {
        if step == LoadStep::Tokenizer {
            println!();
        }
        println!("{step}");
    })?;

    println!("\n✓ Model loaded successfully!");
    println!(
        "✓ Responses will be logged to: {}",
        transcript.path().display()
    );
    println!("\nReady for input! Type your prompt below (type 'quit' to exit):");

    Ok((pipeline, transcript))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose);
    if let Some(path) = logging::log_file_path() {
        eprintln!("Debug log: {}", path.display());
    }

    if let Some(Commands::Config { command }) = &cli.command {
        run_config_command(&cli.config_path, command);
        return Ok(());
    }

    let (mut pipeline, transcript) =
        start(&cli).inspect_err(|e| println!("Error initializing model: {e}"))?;

    let span = tracing::info_span!(
        "session",
        id = %Uuid::new_v4(),
        backend = pipeline.name(),
        model = pipeline.model()
    );
    Repl::new(&mut pipeline, &transcript, io::stdout())
        .run(repl::spawn_stdin_reader(), tokio::signal::ctrl_c())
        .instrument(span)
        .await?;

    Ok(())
}
