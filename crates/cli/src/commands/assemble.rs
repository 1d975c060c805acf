//! `chatwindow assemble` — Fit a transcript into the token budget.
//!
//! A transcript is a JSON document:
//!
//! ```json
//! {
//!   "system_prompt": "You are a helpful assistant.",
//!   "context_prompt": "The user is editing main.rs",
//!   "retrieved": ["snippet one", "snippet two"],
//!   "functions": [{"name": "search", "description": "...", "parameters": {}}],
//!   "history": [{"role": "user", "content": "Hello"}]
//! }
//! ```
//!
//! Every field is optional.

use chatwindow_config::{AppConfig, MemoryConfig};
use chatwindow_core::{FunctionDeclaration, Message, Role, StaticFunctionCatalog, TokenEncoder};
use chatwindow_memory::{MemoryStore, build_encoder};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Everything the store needs for one assembly, as read from disk.
#[derive(Debug, Default, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub context_prompt: String,
    #[serde(default)]
    pub retrieved: Vec<String>,
    #[serde(default)]
    pub functions: Vec<FunctionDeclaration>,
    #[serde(default)]
    pub history: Vec<Message>,
}

impl Transcript {
    pub fn load(path: &Path) -> chatwindow_core::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Load a transcript into a fresh store.
pub fn build_store(
    transcript: Transcript,
    config: MemoryConfig,
    encoder: Arc<dyn TokenEncoder>,
) -> MemoryStore {
    let mut store = MemoryStore::new(config, encoder)
        .with_function_catalog(Arc::new(StaticFunctionCatalog::new(transcript.functions)))
        .with_system_prompt(transcript.system_prompt);
    store.set_context_prompt(transcript.context_prompt);
    store.set_retrieved_content(transcript.retrieved);
    let history = transcript.history;
    store.mutate_history(move |h| h.extend(history));
    store
}

pub async fn run(
    path: &Path,
    max_messages: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let transcript = Transcript::load(path)?;
    tracing::debug!(
        path = %path.display(),
        history = transcript.history.len(),
        snippets = transcript.retrieved.len(),
        "Transcript loaded"
    );

    let encoder = build_encoder(config.memory.encoder);
    let mut store = build_store(transcript, config.memory, encoder);
    match max_messages {
        Some(n) => store.refresh_with_max_messages(n),
        None => store.refresh(),
    }

    if json {
        let out = serde_json::json!({
            "messages": store.messages(),
            "metadata": store.last_metadata(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let meta = store.last_metadata();
    println!("📨 Assembled Prompt ({})", store.encoder().name());
    println!("─────────────────────────────────────");
    for message in store.messages() {
        let role = match message.role() {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        };
        let preview: String = message.content().unwrap_or("").chars().take(60).collect();
        println!("  [{role:<9}] {preview}");
    }
    println!();
    println!("  Budget:     {} tokens", meta.available);
    println!("  Used:       {} tokens", meta.total_tokens);
    for tier in &meta.tiers {
        println!(
            "  {:<10}  {:>6} tokens  {}/{} items",
            tier.name, tier.tokens, tier.items_included, tier.items_total
        );
    }
    for warning in &meta.warnings {
        println!("  ⚠️  {warning}");
    }

    Ok(())
}
