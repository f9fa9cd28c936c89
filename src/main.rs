use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skyvet::cli;
use skyvet::cli::vet::{LlmOverrides, VetAction};

#[derive(Parser)]
#[command(name = "skyvet", version)]
#[command(about = "Flatten transient-candidate JSON into ML-ready tables and vet candidates with an LLM", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./skyvet.toml or ~/.config/skyvet/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the sources and lightcurves tables from a JSON export
    Build {
        /// JSON file whose top level is a list of source records
        input: String,

        /// Output directory for the two tables
        #[arg(short = 'o', long, default_value = "data")]
        output: String,

        /// Table format: csv or jsonl (default: from config)
        #[arg(long)]
        format: Option<String>,

        /// Fail on the first invalid record instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Print the structured summary of one candidate as JSON
    Summary {
        /// Source id
        id: String,

        /// Directory holding the built tables
        #[arg(long, default_value = "data")]
        data: String,
    },

    /// Print the prompts the copilot would send for one candidate
    Prompt {
        /// Source id
        id: String,

        #[arg(long, default_value = "data")]
        data: String,
    },

    /// Ask the LLM copilot to vet one candidate
    Vet {
        /// Source id
        id: String,

        #[arg(long, default_value = "data")]
        data: String,

        /// Override LLM model (e.g., "mistral:7b-instruct", "gpt-4o")
        #[arg(long)]
        model: Option<String>,

        /// Override LLM provider: ollama, openai, openai-compatible, anthropic
        #[arg(long)]
        provider: Option<String>,

        /// Override the provider endpoint
        #[arg(long)]
        base_url: Option<String>,

        /// Use mock LLM client instead of calling a model
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and, optionally, a built data directory
    ConfigCheck {
        #[arg(long)]
        data: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            format,
            strict,
        } => {
            cli::build::run(input, output, format, strict, cli.config)?;
        }
        Commands::Summary { id, data } => {
            let out = cli::vet::run(
                id,
                data,
                VetAction::Summary,
                cli.config,
                LlmOverrides::default(),
                false,
            )
            .await?;
            println!("{}", out);
        }
        Commands::Prompt { id, data } => {
            let out = cli::vet::run(
                id,
                data,
                VetAction::Prompt,
                cli.config,
                LlmOverrides::default(),
                false,
            )
            .await?;
            println!("{}", out);
        }
        Commands::Vet {
            id,
            data,
            model,
            provider,
            base_url,
            dry_run,
        } => {
            let overrides = LlmOverrides {
                model,
                provider,
                base_url,
            };
            let out =
                cli::vet::run(id, data, VetAction::Ask, cli.config, overrides, dry_run).await?;
            println!("{}", out);
        }
        Commands::ConfigCheck { data } => {
            cli::config_check::run(cli.config, data)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_build_defaults() {
        let cli = Cli::try_parse_from(["skyvet", "build", "sources.json"]).unwrap();
        match cli.command {
            Commands::Build {
                input,
                output,
                format,
                strict,
            } => {
                assert_eq!(input, "sources.json");
                assert_eq!(output, "data");
                assert!(format.is_none());
                assert!(!strict);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_build_with_all_args() {
        let cli = Cli::try_parse_from([
            "skyvet",
            "build",
            "export.json",
            "-o",
            "tables",
            "--format",
            "jsonl",
            "--strict",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        match cli.command {
            Commands::Build {
                output,
                format,
                strict,
                ..
            } => {
                assert_eq!(output, "tables");
                assert_eq!(format.as_deref(), Some("jsonl"));
                assert!(strict);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_vet_overrides() {
        let cli = Cli::try_parse_from([
            "skyvet",
            "vet",
            "ZTF21abc",
            "--provider",
            "openai-compatible",
            "--model",
            "llama3",
            "--base-url",
            "http://gpu:8000/v1",
            "--dry-run",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Vet {
                id,
                data,
                model,
                provider,
                base_url,
                dry_run,
            } => {
                assert_eq!(id, "ZTF21abc");
                assert_eq!(data, "data");
                assert_eq!(model.as_deref(), Some("llama3"));
                assert_eq!(provider.as_deref(), Some("openai-compatible"));
                assert_eq!(base_url.as_deref(), Some("http://gpu:8000/v1"));
                assert!(dry_run);
            }
            _ => panic!("expected vet"),
        }
    }

    #[test]
    fn test_parse_config_check() {
        let cli = Cli::try_parse_from(["skyvet", "config-check", "--data", "out"]).unwrap();
        match cli.command {
            Commands::ConfigCheck { data } => assert_eq!(data.as_deref(), Some("out")),
            _ => panic!("expected config-check"),
        }
    }

    #[test]
    fn test_parse_missing_subcommand() {
        assert!(Cli::try_parse_from(["skyvet"]).is_err());
    }

    #[test]
    fn test_summary_requires_id() {
        assert!(Cli::try_parse_from(["skyvet", "summary"]).is_err());
    }
}
