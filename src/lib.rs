//! skyvet - flatten transient-candidate exports into ML-ready tables
//!
//! Turns nested survey JSON (SkyPortal-style source records with TNS
//! enrichment) into a source-level table and a long-format lightcurve table
//! sharing an `id` join key, then feeds per-candidate summaries to an LLM
//! (Ollama, OpenAI-compatible, Anthropic) for qualitative vetting.

pub mod cli;
pub mod config;
pub mod copilot;
pub mod llm;
pub mod pipeline;
pub mod util;
