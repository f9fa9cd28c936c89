use anyhow::Result;
use std::env;
use std::path::Path;

use crate::config::{Config, LlmConfig, PromptMode, Provider};

struct CheckResult {
    passed: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl CheckResult {
    fn new() -> Self {
        Self {
            passed: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn pass(&mut self, msg: impl Into<String>) {
        self.passed.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

pub fn run(config_path: Option<String>, data_dir: Option<String>) -> Result<()> {
    let mut results = CheckResult::new();

    let config = match Config::load_with_path(config_path.clone()) {
        Ok(config) => {
            let source = config_path.as_deref().unwrap_or("default search path");
            results.pass(format!("Config loaded from {}", source));
            config
        }
        Err(e) => {
            results.error(format!("Failed to load config: {:#}", e));
            print_results(&results);
            anyhow::bail!("config could not be loaded");
        }
    };

    check_config(&config, data_dir.as_deref().map(Path::new), &mut results);
    print_results(&results);

    if !results.errors.is_empty() {
        anyhow::bail!("{} config error(s) found", results.errors.len());
    }

    Ok(())
}

fn check_config(config: &Config, data_dir: Option<&Path>, results: &mut CheckResult) {
    results.pass(format!(
        "LLM provider: {} (model: {})",
        config.llm.provider, config.llm.model
    ));
    results.pass(format!("Endpoint: {}", config.llm.get_base_url()));

    check_api_key(&config.llm, results);

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        results.error(format!(
            "temperature {} is outside 0.0..=2.0",
            config.llm.temperature
        ));
    } else if config.llm.temperature > 1.0 {
        results.warn(format!(
            "temperature {} is high for a vetting assistant; answers may drift",
            config.llm.temperature
        ));
    }

    if config.llm.provider == Provider::Ollama && config.llm.num_ctx < 2048 {
        results.warn(format!(
            "num_ctx {} is small; the candidate prompt may be truncated",
            config.llm.num_ctx
        ));
    }

    if config.prompts.interests.is_empty() {
        results.warn("No interests configured in [prompts]; the copilot has no target classes");
    }
    if config.prompts.system_mode == PromptMode::Overwrite && config.prompts.system_custom.is_none()
    {
        results.warn("system_mode = \"overwrite\" without system_custom; default prompt is used");
    }

    results.pass(format!(
        "Dataset: format={}, strict={}",
        config.dataset.format, config.dataset.strict
    ));

    if let Some(dir) = data_dir {
        for path in [
            config.dataset.sources_path(dir),
            config.dataset.lightcurves_path(dir),
        ] {
            if path.is_file() {
                results.pass(format!("Table found: {}", path.display()));
            } else {
                results.error(format!(
                    "Table missing: {} (run `skyvet build` first)",
                    path.display()
                ));
            }
        }
    }
}

fn check_api_key(llm: &LlmConfig, results: &mut CheckResult) {
    let optional = llm.provider.key_optional();
    match &llm.api_key_env {
        Some(env_var) if env_var.eq_ignore_ascii_case("none") => {
            results.pass("API key: none needed");
        }
        Some(env_var) => match env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => {
                results.pass(format!("API key: {} is set", env_var));
            }
            _ if optional => {
                results.warn(format!(
                    "API key: {} is not set (OK for local models, needed for gateways)",
                    env_var
                ));
            }
            _ => {
                results.error(format!("API key: {} is not set", env_var));
            }
        },
        None if optional => {
            results.pass("API key: none configured (local provider)");
        }
        None => {
            results.error(format!(
                "API key: provider {} needs api_key_env in [llm]",
                llm.provider
            ));
        }
    }
}

fn print_results(results: &CheckResult) {
    println!();
    for msg in &results.passed {
        println!("  \u{2713} {}", msg);
    }
    for msg in &results.warnings {
        println!("  ! {}", msg);
    }
    for msg in &results.errors {
        println!("  \u{2717} {}", msg);
    }
    println!();
    println!(
        "{} passed, {} warnings, {} errors",
        results.passed.len(),
        results.warnings.len(),
        results.errors.len()
    );
}
