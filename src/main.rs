use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rfxgen::cli::Cli;
use rfxgen::compiler::{CheckRunner, detect_compiler};
use rfxgen::config::Config;
use rfxgen::domain::SessionOutcome;
use rfxgen::error::RfxgenError;
use rfxgen::feedback::FeedbackMode;
use rfxgen::id::generate_session_id;
use rfxgen::llm::{LlmClient, VllmClient, VllmConfig};
use rfxgen::prompt::{load_system_prompt, load_task};
use rfxgen::runner::{Session, SessionConfig};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rfxgen")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("rfxgen.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Flatten CLI flags over the config file into one session setup.
struct Settings {
    host: String,
    port: u16,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
    output: PathBuf,
    mode: FeedbackMode,
    fresh_context: bool,
    save_prompts: bool,
    verbose: bool,
    compiler: Option<PathBuf>,
    check_timeout: Duration,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let mode = match &cli.mode {
            Some(raw) => raw.parse::<FeedbackMode>()?,
            None => config.feedback.mode,
        };

        Ok(Self {
            host: cli.host.clone().unwrap_or_else(|| config.llm.host.clone()),
            port: cli.port.unwrap_or(config.llm.port),
            temperature: cli.temperature.unwrap_or(config.llm.temperature),
            max_tokens: config.llm.max_tokens,
            max_iterations: cli.max_iterations.unwrap_or(config.session.max_iterations),
            output: cli.output.clone().unwrap_or_else(|| config.session.output.clone()),
            mode,
            fresh_context: cli.fresh_context || config.feedback.fresh_context,
            save_prompts: cli.save_prompts || config.debug.save_prompts,
            verbose: cli.is_verbose(),
            compiler: config.compiler.path.clone(),
            check_timeout: Duration::from_millis(config.compiler.check_timeout_ms),
        })
    }
}

/// Resolve the reflexc path: explicit config value first, then the known
/// install locations and PATH.
async fn resolve_compiler(settings: &Settings) -> Option<PathBuf> {
    if let Some(path) = &settings.compiler {
        return Some(path.clone());
    }
    detect_compiler().await
}

async fn run_session(cli: &Cli, config: &Config) -> Result<i32> {
    let settings = Settings::resolve(cli, config)?;
    let session_id = generate_session_id();
    info!("session {session_id}: task {}", cli.prompt.display());

    if settings.mode == FeedbackMode::Minimal {
        println!("Using minimal mode (smaller model optimizations)");
    }

    let system_prompt = load_system_prompt(cli.system_prompt.as_deref(), settings.mode)
        .context("Failed to load system prompt")?;
    let task = load_task(&cli.prompt).context("Failed to load task prompt")?;

    println!("Connecting to vLLM at {}:{}...", settings.host, settings.port);
    let llm = match VllmClient::connect(VllmConfig::new(&settings.host, settings.port)).await {
        Ok(client) => client,
        Err(RfxgenError::ServerUnreachable(url)) => {
            eprintln!("{}", format!("Error: Cannot connect to vLLM server at {url}").red());
            eprintln!("Make sure vLLM is running: vllm serve ...");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };
    println!("{}", "Connected to vLLM server".green());
    println!("Using model: {}", llm.model());

    let Some(compiler) = resolve_compiler(&settings).await else {
        eprintln!("{}", "Error: Cannot find reflexc compiler".red());
        eprintln!("Expected locations:");
        eprintln!("  ARM64: /home/thinkcircuits/Reflexible/Reflexscript/build/reflexc");
        eprintln!("  x86_64: /home/thinkcircuits/Reflexible/reflexible-platforms/tools/reflexc/bin/reflexc");
        return Ok(1);
    };
    let runner = CheckRunner::new(&compiler).with_timeout(settings.check_timeout);
    println!("Using compiler: {}", compiler.display());

    println!("\nOutput file: {}", settings.output.display());
    println!("Max iterations: {}", settings.max_iterations);
    println!("{}", "=".repeat(60));

    let session = Session::new(
        Arc::new(llm),
        runner,
        SessionConfig {
            max_iterations: settings.max_iterations,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            output_path: settings.output,
            feedback_mode: settings.mode,
            fresh_context: settings.fresh_context,
            save_prompts: settings.save_prompts,
            verbose: settings.verbose,
            echo: true,
        },
    );

    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "Interrupt received, stopping after the current operation...".yellow());
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = session.run(&system_prompt, &task).await?;
    info!(
        "session {session_id}: {:?} after {} iteration(s)",
        report.outcome, report.iterations
    );

    match report.outcome {
        SessionOutcome::Success => Ok(0),
        SessionOutcome::Exhausted => Ok(1),
        SessionOutcome::Cancelled => {
            println!("\n{}", "Cancelled".yellow().bold());
            if report.candidate.is_some() {
                println!("Last attempt saved to: {}", report.output_path.display());
            }
            Ok(130)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    let code = run_session(&cli, &config).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
