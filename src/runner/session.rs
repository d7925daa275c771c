//! The generate / check / feedback loop.
//!
//! One `Session` drives a complete run: prompt the model, extract a
//! candidate, write it to the output path, run reflexc, and either stop on
//! success or feed the diagnostics back as the next user turn. The budget
//! is strict: at most `max_iterations` model calls, every pass through the
//! loop consumes one iteration, and the last written artifact is left on
//! disk however the session ends.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

use crate::artifact;
use crate::compiler::{CheckOutcome, CheckRunner, CompilationReport, Diagnostic, parse_diagnostics};
use crate::domain::{Candidate, SessionOutcome, SessionReport, Transcript};
use crate::error::Result;
use crate::extract::extract_candidate;
use crate::feedback::{FeedbackComposer, FeedbackMode, compose_single_shot, composer_for};
use crate::llm::{
    ChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, LlmClient, StreamChunk,
    create_stream_channel,
};

const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Session tuning knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model call budget; also bounds total loop passes
    pub max_iterations: u32,

    /// Sampling temperature for every request
    pub temperature: f32,

    /// Token cap for every request
    pub max_tokens: u32,

    /// Where the candidate is written before each check
    pub output_path: PathBuf,

    /// Feedback style for failed checks
    pub feedback_mode: FeedbackMode,

    /// Rebuild the transcript from scratch each iteration instead of
    /// accumulating history
    pub fresh_context: bool,

    /// Dump every request payload next to the output file
    pub save_prompts: bool,

    /// Print full compiler output and request details
    pub verbose: bool,

    /// Echo streamed reply fragments to stdout as they arrive
    pub echo: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            output_path: PathBuf::from("output.rfx"),
            feedback_mode: FeedbackMode::default(),
            fresh_context: false,
            save_prompts: false,
            verbose: false,
            echo: true,
        }
    }
}

/// Drives one generation session against a model and a compiler.
pub struct Session<L: LlmClient> {
    llm: Arc<L>,
    runner: CheckRunner,
    composer: Box<dyn FeedbackComposer>,
    config: SessionConfig,
    cancel: Arc<AtomicBool>,
}

impl<L: LlmClient> Session<L> {
    pub fn new(llm: Arc<L>, runner: CheckRunner, config: SessionConfig) -> Self {
        Self {
            llm,
            runner,
            composer: composer_for(config.feedback_mode),
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag a signal handler can set to stop the loop between
    /// operations.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the loop to a terminal state.
    ///
    /// `Ok` covers success, budget exhaustion, and cancellation; `Err` is
    /// reserved for fatal conditions (missing compiler, rejected auth,
    /// unexpected IO).
    pub async fn run(&self, system_prompt: &str, task: &str) -> Result<SessionReport> {
        // a bad compiler path must not burn any model calls
        self.runner.preflight()?;

        let max = self.config.max_iterations;
        let mut transcript = Transcript::new(system_prompt, task);
        let mut current: Option<Candidate> = None;
        let mut last_diagnostics: Vec<Diagnostic> = Vec::new();
        let mut saved_system_prompt = false;

        let mut iteration = 1;
        while iteration <= max {
            if self.cancelled() {
                return Ok(self.report(SessionOutcome::Cancelled, iteration - 1, current));
            }

            println!("\n[{iteration}/{max}] Generating ReflexScript code...");

            if self.config.fresh_context {
                transcript = match &current {
                    Some(candidate) => Transcript::new(
                        system_prompt,
                        compose_single_shot(task, candidate, &last_diagnostics),
                    ),
                    None => Transcript::new(system_prompt, task),
                };
            }

            self.print_request_summary(&transcript, system_prompt, iteration);

            if self.config.save_prompts {
                if !saved_system_prompt {
                    let path = artifact::save_system_prompt(&self.config.output_path, system_prompt)?;
                    println!("  Saved system prompt to: {}", path.display());
                    saved_system_prompt = true;
                }
                let path =
                    artifact::save_conversation(&self.config.output_path, iteration, &transcript)?;
                println!("  Saved conversation to: {}", path.display());
            }

            let reply = self.generate(&transcript).await?;

            if self.cancelled() {
                return Ok(self.report(SessionOutcome::Cancelled, iteration - 1, current));
            }

            let candidate = match reply {
                Some(content) => {
                    transcript.push_assistant(&content);
                    match extract_candidate(&content) {
                        Some(source) => Candidate::new(source, iteration),
                        None => {
                            println!(
                                "{}",
                                "Warning: No ReflexScript code found in response".yellow()
                            );
                            match &current {
                                // re-check the previous attempt; its feedback
                                // becomes the re-prompt
                                Some(prior) => prior.clone(),
                                None => {
                                    iteration += 1;
                                    continue;
                                }
                            }
                        }
                    }
                }
                None => {
                    println!("{}", "Warning: Empty response from LLM".yellow());
                    match &current {
                        Some(prior) => prior.clone(),
                        None => {
                            iteration += 1;
                            continue;
                        }
                    }
                }
            };

            artifact::write_candidate(&self.config.output_path, &candidate.source)?;

            println!("\n[{iteration}/{max}] Compiling with reflexc...");
            let outcome = self.runner.check(&self.config.output_path).await?;

            if outcome.success {
                println!(
                    "\n{}",
                    format!("SUCCESS after {iteration} iteration(s)").green().bold()
                );
                println!("Output: {}", self.config.output_path.display());
                if !outcome.output.is_empty() {
                    println!("\nCompiler output:\n{}", outcome.output);
                }
                return Ok(self.report(SessionOutcome::Success, iteration, Some(candidate)));
            }

            last_diagnostics = parse_diagnostics(&outcome.output);
            self.print_failure(iteration, &last_diagnostics, &outcome);

            if !self.config.fresh_context {
                let feedback =
                    self.composer
                        .compose(&candidate, &last_diagnostics, &outcome.output);
                transcript.push_user(feedback);
            }

            current = Some(candidate);
            iteration += 1;
        }

        println!("\n{}", format!("FAILED after {max} iterations").red().bold());
        println!(
            "Last attempt saved to: {}",
            self.config.output_path.display()
        );
        Ok(self.report(SessionOutcome::Exhausted, max, current))
    }

    /// One model call: stream the reply, echo fragments, collapse transport
    /// hiccups into an empty reply so the loop can spend an iteration on
    /// them instead of dying.
    async fn generate(&self, transcript: &Transcript) -> Result<Option<String>> {
        let request = ChatRequest::new(transcript.messages().to_vec())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let (chunk_tx, mut handle) = create_stream_channel(64);
        let echo = self.config.echo;
        let printer = tokio::spawn(async move {
            while let Some(chunk) = handle.recv().await {
                match chunk {
                    StreamChunk::Text(text) => {
                        if echo {
                            print!("{text}");
                            let _ = std::io::stdout().flush();
                        }
                    }
                    StreamChunk::Done => break,
                    StreamChunk::Error(message) => {
                        log::warn!("stream interrupted: {message}");
                        break;
                    }
                }
            }
        });

        let result = self.llm.stream(request, chunk_tx).await;
        let _ = printer.await;
        if echo {
            println!();
        }

        match result {
            Ok(reply) => {
                if reply.truncated() {
                    log::warn!("reply was truncated at the token limit");
                }
                Ok((!reply.is_empty()).then(|| reply.content))
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("model call failed, treating as empty reply: {e}");
                println!("{}", format!("Warning: {e}").yellow());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn print_request_summary(&self, transcript: &Transcript, system_prompt: &str, iteration: u32) {
        let message_count = transcript.len();
        let total_chars = transcript.total_chars();

        if self.config.verbose {
            println!("\n{}", "=".repeat(60));
            println!("SENDING TO LLM:");
            println!("{}", "=".repeat(60));
            println!("Conversation: {message_count} messages, {total_chars} total chars");
            println!("System prompt: {} chars", system_prompt.len());
            if iteration > 1 {
                if let Some(last) = transcript.messages().last() {
                    println!("{}", "-".repeat(60));
                    println!("Latest feedback:");
                    println!("{}", last.content.chars().take(2000).collect::<String>());
                }
            }
            println!("{}\n", "=".repeat(60));
        } else {
            println!("  Conversation: {message_count} messages, {total_chars} total chars");
            if iteration > 1 {
                println!(
                    "  (includes {} previous attempt(s) with errors)",
                    iteration - 1
                );
            }
        }
    }

    fn print_failure(&self, iteration: u32, diagnostics: &[Diagnostic], outcome: &CheckOutcome) {
        let max = self.config.max_iterations;
        let shown_count = if diagnostics.is_empty() {
            1
        } else {
            diagnostics.len()
        };
        println!(
            "{}",
            format!("[{iteration}/{max}] Found {shown_count} error(s)").red()
        );

        let report = CompilationReport::from_output(&outcome.output);
        println!("  {}", report.summary());

        if self.config.verbose || diagnostics.is_empty() {
            println!("\nCompiler output:\n{}", outcome.output);
        } else {
            for diagnostic in diagnostics {
                println!(
                    "  Line {}: [{}] {}",
                    diagnostic.line, diagnostic.kind, diagnostic.message
                );
                if let Some(suggestion) = &diagnostic.suggestion {
                    println!("    Suggestion: {suggestion}");
                }
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn report(
        &self,
        outcome: SessionOutcome,
        iterations: u32,
        candidate: Option<Candidate>,
    ) -> SessionReport {
        SessionReport {
            outcome,
            iterations,
            candidate,
            output_path: self.config.output_path.clone(),
        }
    }
}
