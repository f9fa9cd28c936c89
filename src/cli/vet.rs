use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::{Config, Provider};
use crate::copilot::summary::{self, CandidateSummary};
use crate::copilot::{prompts, Copilot, VetReport};
use crate::llm::factory;
use crate::pipeline;

/// What `vet` should do with the candidate once it is summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetAction {
    /// Print the structured summary as JSON
    Summary,
    /// Print the rendered prompts
    Prompt,
    /// Send the prompts to the model and print its answer
    Ask,
}

/// LLM settings given on the command line; each one wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct LlmOverrides {
    pub model: Option<String>,
    pub provider: Option<String>,
    pub base_url: Option<String>,
}

/// Summarise a candidate from the tables under `data_dir`.
pub fn load_summary(source_id: &str, data_dir: &Path, config: &Config) -> Result<CandidateSummary> {
    let tables = pipeline::load_tables(data_dir, &config.dataset)
        .with_context(|| format!("Failed to load tables from {}", data_dir.display()))?;
    summary::candidate_summary(source_id, &tables.sources, &tables.lightcurves)
}

pub async fn run(
    source_id: String,
    data_dir: String,
    action: VetAction,
    config_path: Option<String>,
    overrides: LlmOverrides,
    dry_run: bool,
) -> Result<String> {
    let mut config = Config::load_with_path(config_path)?;

    if let Some(ref provider) = overrides.provider {
        info!("CLI override: provider = {}", provider);
        config.llm.provider = Provider::from_str(provider)?;
    }
    if let Some(ref model) = overrides.model {
        info!("CLI override: model = {}", model);
        config.llm.model = model.clone();
    }
    if let Some(ref base_url) = overrides.base_url {
        info!("CLI override: base_url = {}", base_url);
        config.llm.base_url = Some(base_url.clone());
    }

    let summary = load_summary(&source_id, Path::new(&data_dir), &config)?;

    let output = match action {
        VetAction::Summary => serde_json::to_string_pretty(&summary)?,
        VetAction::Prompt => {
            let system = prompts::system_prompt(&config.prompts);
            let prompt = prompts::build_prompt(&summary, &config.prompts);
            format!("=== System ===\n{}\n\n=== Prompt ===\n{}", system, prompt)
        }
        VetAction::Ask => {
            info!(
                "Using {} model {}{}",
                config.llm.provider,
                config.llm.model,
                if dry_run { " (dry run)" } else { "" }
            );
            let client = factory::create_client(&config.llm, dry_run)?;
            let copilot = Copilot::new(client.as_ref()).with_prompts_config(config.prompts);
            let VetReport { response, .. } = copilot.vet(&summary).await?;
            response
        }
    };

    Ok(output)
}
