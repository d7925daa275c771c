//! CLI command definitions using clap.
//!
//! One flat command: task prompt in, verified ReflexScript artifact out.
//! Value flags are optional so the config file can supply anything the
//! command line leaves unset.

use clap::Parser;
use std::path::PathBuf;

/// Rfxgen - Iteratively generates compiler-verified ReflexScript
#[derive(Parser, Debug)]
#[command(name = "rfxgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the task prompt file
    #[arg(short, long)]
    pub prompt: PathBuf,

    /// Path to a system prompt file (default: built-in prompt for the active mode)
    #[arg(short, long)]
    pub system_prompt: Option<PathBuf>,

    /// Output .rfx file path (default: output.rfx)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum generation attempts (default: 5)
    #[arg(short = 'n', long)]
    pub max_iterations: Option<u32>,

    /// vLLM server host (default: localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// vLLM server port (default: 8000)
    #[arg(long)]
    pub port: Option<u16>,

    /// Sampling temperature (default: 0.1)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Feedback mode (minimal, rich)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Rebuild the prompt from scratch each attempt instead of keeping history
    #[arg(long)]
    pub fresh_context: bool,

    /// Save prompts to debug_prompts/ for inspection
    #[arg(long)]
    pub save_prompts: bool,

    /// Print detailed progress and full compiler output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prompt_is_required() {
        let result = Cli::try_parse_from(["rfxgen"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["rfxgen", "--prompt", "task.txt"]).unwrap();
        assert_eq!(cli.prompt, PathBuf::from("task.txt"));
        assert!(cli.config.is_none());
        assert!(cli.system_prompt.is_none());
        assert!(cli.output.is_none());
        assert!(cli.max_iterations.is_none());
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.temperature.is_none());
        assert!(cli.mode.is_none());
        assert!(!cli.fresh_context);
        assert!(!cli.save_prompts);
        assert!(!cli.is_verbose());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["rfxgen", "-p", "task.txt", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["rfxgen", "-p", "task.txt", "-c", "/path/to/rfxgen.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/rfxgen.yml")));
    }

    #[test]
    fn test_server_overrides() {
        let cli = Cli::try_parse_from(["rfxgen", "-p", "task.txt", "--host", "192.168.1.100", "--port", "8080"]).unwrap();
        assert_eq!(cli.host, Some("192.168.1.100".to_string()));
        assert_eq!(cli.port, Some(8080));
    }

    #[test]
    fn test_generation_overrides() {
        let cli = Cli::try_parse_from([
            "rfxgen",
            "-p",
            "task.txt",
            "-o",
            "controller.rfx",
            "-n",
            "10",
            "-t",
            "0.3",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("controller.rfx")));
        assert_eq!(cli.max_iterations, Some(10));
        assert_eq!(cli.temperature, Some(0.3));
    }

    #[test]
    fn test_mode_choice() {
        let cli = Cli::try_parse_from(["rfxgen", "-p", "task.txt", "-m", "minimal"]).unwrap();
        assert_eq!(cli.mode, Some("minimal".to_string()));
    }

    #[test]
    fn test_debug_flags() {
        let cli = Cli::try_parse_from(["rfxgen", "-p", "task.txt", "--fresh-context", "--save-prompts"]).unwrap();
        assert!(cli.fresh_context);
        assert!(cli.save_prompts);
    }

    #[test]
    fn test_system_prompt_override() {
        let cli = Cli::try_parse_from(["rfxgen", "-p", "task.txt", "-s", "custom_prompt.md"]).unwrap();
        assert_eq!(cli.system_prompt, Some(PathBuf::from("custom_prompt.md")));
    }
}
