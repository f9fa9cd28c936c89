use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single-turn completion: one system message, one user message.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Offline client for `--dry-run` and tests.
pub struct MockLlmClient;

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        // Echo the candidate id so callers can tell responses apart
        let id = prompt
            .lines()
            .find_map(|l| l.strip_prefix("ID: "))
            .unwrap_or("unknown");

        Ok(format!(
            "[mock] Candidate {}\n\
             1. Summary: structured record received; no model was consulted.\n\
             2. Extragalactic: cannot assess in dry-run mode.\n\
             3. Follow-up: undecided.\n\
             4. Suggested follow-up: none.",
            id
        ))
    }
}
