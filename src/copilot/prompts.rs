// Prompt text for the vetting copilot

use crate::config::{PromptMode, PromptsConfig};
use crate::util::or_unknown;

use super::summary::CandidateSummary;

pub const SYSTEM_PROMPT: &str = "You are an expert astronomy assistant helping astronomers classify \
optical transients and decide whether follow-up observations are needed.\n\
Important:\n\
- Some sources are early-stage candidates with limited information.\n\
- Some sources are already reported to TNS and may have confirmed classifications.\n\
- TNS reports, spectra, and redshift measurements are high-confidence signals.\n\
- Pipeline heuristic flags (e.g. is_transient) are lower-confidence.\n\
Be concise and explicit about uncertainty.";

/// System prompt with any configured customisation applied.
pub fn system_prompt(config: &PromptsConfig) -> String {
    match (&config.system_custom, config.system_mode) {
        (Some(custom), PromptMode::Overwrite) => custom.clone(),
        (Some(custom), PromptMode::Append) => format!("{}\n\n{}", SYSTEM_PROMPT, custom),
        (None, _) => SYSTEM_PROMPT.to_string(),
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none specified)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn filter_list(filters: &[String]) -> String {
    if filters.is_empty() {
        "none".to_string()
    } else {
        filters.join(", ")
    }
}

/// Build the user prompt for one candidate.
///
/// Missing values render as `unknown` so the model sees that a field is
/// absent rather than false or zero.
pub fn build_prompt(summary: &CandidateSummary, config: &PromptsConfig) -> String {
    let s = &summary.source;
    let lc = &summary.lightcurve;

    let mut prompt = format!(
        r#"
The astronomer is mainly interested in:
{interests}

They want to avoid:
{avoid}

=== Source metadata ===
ID: {id}
RA / Dec: {ra}, {dec}
Detection score: {score}

Pipeline flags:
- Is transient (heuristic): {is_transient}
- Is variable star: {is_varstar}
- Is minor object: {is_roid}

High-confidence signals:
- TNS reported: {has_tns}
- Redshift available: {has_redshift}
- Spectra available: {has_spectra} ({n_spectra} distinct)
- Redshift value: {redshift}
- TNS label (if any): {label}

=== Lightcurve summary ===
Number of photometry points: {n_points}
Number of detections: {n_detections}
Filters used: {filters}
Flux range: {flux_min} to {flux_max}
Observed time span (days): {span}

=== Task ===
1. Summarize the key information an astronomer should know.
2. Is this transient likely extragalactic? Briefly justify.
3. Does this transient deserve follow-up observations?
4. If yes, suggest what kind of follow-up (e.g. spectroscopy, more photometry).

Be concise and explicit about uncertainty.
"#,
        interests = bullet_list(&config.interests),
        avoid = bullet_list(&config.avoid),
        id = s.id,
        ra = s.ra,
        dec = s.dec,
        score = or_unknown(s.score),
        is_transient = or_unknown(s.is_transient),
        is_varstar = or_unknown(s.is_varstar),
        is_roid = or_unknown(s.is_roid),
        has_tns = s.has_tns,
        has_redshift = s.has_redshift,
        has_spectra = s.has_spectra,
        n_spectra = s.n_spectra,
        redshift = or_unknown(s.redshift),
        label = or_unknown(s.label.as_deref()),
        n_points = lc.n_points,
        n_detections = lc.n_detections,
        filters = filter_list(&lc.filters),
        flux_min = or_unknown(lc.flux_min),
        flux_max = or_unknown(lc.flux_max),
        span = or_unknown(lc.time_span_days),
    );

    if let Some(ref extra) = config.task_custom {
        prompt.push_str("\n## Additional Instructions\n\n");
        prompt.push_str(extra);
        prompt.push('\n');
    }

    prompt.trim().to_string()
}
