//! Command-line interface for transcript-actions
//!
//! Flags override the matching `TRANSCRIPT_ACTIONS_*` environment values.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{
    AppConfig, ENV_END_MARKER, ENV_MODEL, ENV_PROMPT_DIR, ENV_PROVIDER, ENV_START_MARKER,
};
use crate::pipeline::PipelineError;

/// Turn meeting transcripts into structured action items
#[derive(Parser, Debug)]
#[command(name = "transcript-actions", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log filter used when RUST_LOG is unset (e.g. info, debug)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Model provider (gemini, openai)
    #[arg(long, global = true, value_name = "NAME")]
    pub provider: Option<String>,

    /// Model name for the provider
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Directory holding the six prompt template files
    #[arg(long, global = true, value_name = "PATH")]
    pub prompt_dir: Option<PathBuf>,

    /// Only text after this marker is segmented
    #[arg(long, global = true, value_name = "MARKER")]
    pub start_marker: Option<String>,

    /// Only text before this marker is segmented
    #[arg(long, global = true, value_name = "MARKER")]
    pub end_marker: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline once and print the summary as JSON
    Run {
        /// Transcript text, or a path to a .txt transcript file
        input: String,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

impl Cli {
    /// Flag values keyed by the environment variable they replace.
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut map = HashMap::new();
        let mut put = |key, value: Option<String>| {
            if let Some(v) = value {
                map.insert(key, v);
            }
        };
        put(ENV_PROVIDER, self.provider.clone());
        put(ENV_MODEL, self.model.clone());
        put(
            ENV_PROMPT_DIR,
            self.prompt_dir.as_ref().map(|p| p.display().to_string()),
        );
        put(ENV_START_MARKER, self.start_marker.clone());
        put(ENV_END_MARKER, self.end_marker.clone());
        map
    }

    /// Resolve configuration with flags taking precedence over `lookup`.
    pub fn app_config_with<F>(&self, lookup: F) -> Result<AppConfig, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = self.overrides();
        AppConfig::from_lookup(|key| overrides.get(key).cloned().or_else(|| lookup(key)))
    }

    /// Resolve configuration from flags and the process environment.
    pub fn app_config(&self) -> Result<AppConfig, PipelineError> {
        self.app_config_with(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn run_takes_positional_input() {
        let cli = Cli::try_parse_from(["transcript-actions", "run", "meeting.txt"]).unwrap();
        match cli.command {
            Commands::Run { input } => assert_eq!(input, "meeting.txt"),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn serve_defaults_to_localhost_8000() {
        let cli = Cli::try_parse_from(["transcript-actions", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { addr } => assert_eq!(addr, "127.0.0.1:8000".parse().unwrap()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn invalid_addr_rejected() {
        assert!(Cli::try_parse_from(["transcript-actions", "serve", "--addr", "nowhere"]).is_err());
    }

    #[test]
    fn missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["transcript-actions"]).is_err());
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::try_parse_from([
            "transcript-actions",
            "run",
            "x",
            "--provider",
            "openai",
            "--start-marker",
            "BEGIN",
        ])
        .unwrap();
        let config = cli
            .app_config_with(env(&[
                ("TRANSCRIPT_ACTIONS_PROVIDER", "gemini"),
                ("TRANSCRIPT_ACTIONS_START_MARKER", "TRANSCRIPT:"),
                ("TRANSCRIPT_ACTIONS_END_MARKER", "END"),
                ("OPENAI_API_KEY", "sk-test"),
            ]))
            .unwrap();

        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.api_key, "sk-test");
        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.pipeline.start_marker.as_deref(), Some("BEGIN"));
        assert_eq!(config.pipeline.end_marker.as_deref(), Some("END"));
    }

    #[test]
    fn environment_used_without_flags() {
        let cli = Cli::try_parse_from(["transcript-actions", "serve"]).unwrap();
        let config = cli
            .app_config_with(env(&[("TRANSCRIPT_ACTIONS_MODEL", "gemini-1.5-pro")]))
            .unwrap();
        assert_eq!(config.model.provider, "gemini");
        assert_eq!(config.model.model, "gemini-1.5-pro");
        assert!(config.pipeline.prompt_dir.is_none());
    }
}
