//! Vetting copilot: structured candidate summary in, free-text assessment out.
//!
//! The model is an external collaborator. This layer only assembles the
//! summary, renders prompts and forwards them through an [`LlmClient`].

pub mod prompts;
pub mod summary;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::PromptsConfig;
use crate::llm::client::LlmClient;
use crate::pipeline::dataset::SourceRow;
use crate::pipeline::lightcurves::LightcurveRow;
use summary::CandidateSummary;

/// One copilot exchange for a candidate.
#[derive(Debug, Clone, Serialize)]
pub struct VetReport {
    pub id: String,
    pub system: String,
    pub prompt: String,
    pub response: String,
}

pub struct Copilot<'a> {
    client: &'a dyn LlmClient,
    prompts_config: PromptsConfig,
}

impl<'a> Copilot<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self {
            client,
            prompts_config: PromptsConfig::default(),
        }
    }

    pub fn with_prompts_config(mut self, config: PromptsConfig) -> Self {
        self.prompts_config = config;
        self
    }

    /// Render the system and user prompts without calling the model.
    pub fn render(&self, summary: &CandidateSummary) -> (String, String) {
        (
            prompts::system_prompt(&self.prompts_config),
            prompts::build_prompt(summary, &self.prompts_config),
        )
    }

    pub async fn vet(&self, summary: &CandidateSummary) -> Result<VetReport> {
        let id = summary.source.id.clone();
        let (system, prompt) = self.render(summary);

        info!("Asking copilot about {}", id);
        let response = self
            .client
            .complete(&system, &prompt)
            .await
            .with_context(|| format!("Copilot request failed for {}", id))?;

        Ok(VetReport {
            id,
            system,
            prompt,
            response: response.trim().to_string(),
        })
    }
}

/// Summarise one candidate from the two tables and ask the copilot about it.
pub async fn run_copilot_for_source(
    source_id: &str,
    sources: &[SourceRow],
    lightcurves: &[LightcurveRow],
    client: &dyn LlmClient,
    prompts_config: &PromptsConfig,
) -> Result<VetReport> {
    let summary = summary::candidate_summary(source_id, sources, lightcurves)?;
    Copilot::new(client)
        .with_prompts_config(prompts_config.clone())
        .vet(&summary)
        .await
}
