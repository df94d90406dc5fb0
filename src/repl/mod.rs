//! Read-eval-print loop driving a [`TextGenerator`].
//!
//! The loop has two states, awaiting input and generating. Blank lines are
//! discarded, the exit sentinel (case-insensitive) ends the loop without
//! generating, and every generated or failed turn is appended to the
//! transcript before the next prompt is shown.

pub mod input;

use std::future::Future;
use std::io::{self, Write};

use crate::core::Transcript;
use crate::pipeline::TextGenerator;

pub use input::{LineReceiver, spawn_line_reader, spawn_stdin_reader};

pub const EXIT_SENTINEL: &str = "quit";
pub const PROMPT_MARKER: &str = "\n> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Interrupted,
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Skipped,
    Quit,
    Answered { response: String, failed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub exit: ExitReason,
    pub turns: usize,
}

enum Input {
    Line(String),
    Closed,
    Interrupted,
}

#[must_use]
pub fn is_exit_sentinel(line: &str) -> bool {
    line.eq_ignore_ascii_case(EXIT_SENTINEL)
}

pub struct Repl<'a, G: TextGenerator + ?Sized, W: Write> {
    generator: &'a mut G,
    transcript: &'a Transcript,
    out: W,
    turns: usize,
}

impl<'a, G: TextGenerator + ?Sized, W: Write> Repl<'a, G, W> {
    pub const fn new(generator: &'a mut G, transcript: &'a Transcript, out: W) -> Self {
        Self {
            generator,
            transcript,
            out,
            turns: 0,
        }
    }

    /// Runs until the sentinel, end of input, or `interrupt` resolves.
    ///
    /// A pending interrupt wins over buffered input. An interrupt raised while
    /// a turn is generating is observed once that turn has been printed. If the
    /// interrupt itself fails, the loop keeps running without it.
    pub async fn run<I>(
        mut self,
        mut lines: LineReceiver,
        interrupt: I,
    ) -> io::Result<SessionSummary>
    where
        I: Future<Output = io::Result<()>>,
    {
        tokio::pin!(interrupt);
        let mut interrupt_armed = true;

        let exit = loop {
            write!(self.out, "{PROMPT_MARKER}")?;
            self.out.flush()?;

            let input = loop {
                tokio::select! {
                    biased;
                    signal = &mut interrupt, if interrupt_armed => match signal {
                        Ok(()) => break Input::Interrupted,
                        Err(e) => {
                            tracing::warn!("Interrupt handler unavailable: {e}");
                            interrupt_armed = false;
                        }
                    },
                    line = lines.recv() => match line {
                        Some(line) => break Input::Line(line?),
                        None => break Input::Closed,
                    },
                }
            };

            let line = match input {
                Input::Line(line) => line,
                Input::Closed => break ExitReason::EndOfInput,
                Input::Interrupted => {
                    writeln!(self.out, "\nExiting gracefully...")?;
                    break ExitReason::Interrupted;
                }
            };

            if self.handle_line(&line)? == Turn::Quit {
                break ExitReason::Quit;
            }
        };

        tracing::info!(?exit, turns = self.turns, "Session ended");
        Ok(SessionSummary {
            exit,
            turns: self.turns,
        })
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Turn> {
        let prompt = line.trim();
        if prompt.is_empty() {
            return Ok(Turn::Skipped);
        }
        if is_exit_sentinel(prompt) {
            return Ok(Turn::Quit);
        }

        writeln!(self.out, "Processing...")?;
        self.out.flush()?;

        let (response, failed) = self.generate_response(prompt)?;
        writeln!(self.out, "\nResponse: {response}")?;

        match self.transcript.log(prompt, &response) {
            Ok(()) => writeln!(self.out, "(Response logged to file)")?,
            Err(e) => {
                tracing::warn!("Failed to log interaction: {e}");
                writeln!(self.out, "Error processing prompt: {e}")?;
            }
        }

        self.generator.reclaim();
        self.turns += 1;
        Ok(Turn::Answered { response, failed })
    }

    fn generate_response(&mut self, prompt: &str) -> io::Result<(String, bool)> {
        writeln!(self.out, "\nGenerating response for: '{prompt}'")?;
        self.out.flush()?;

        match self.generator.generate(prompt) {
            Ok(text) => {
                writeln!(self.out, "\nGeneration completed!")?;
                Ok((text, false))
            }
            Err(e) => {
                tracing::warn!(model = self.generator.model(), "Generation failed: {e}");
                writeln!(self.out, "Error during generation: {e}")?;
                Ok((format!("Error: {e}"), true))
            }
        }
    }
}
