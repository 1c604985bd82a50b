pub mod analyze;
pub mod chat;
pub mod init;
pub mod knowledge;
pub mod providers;

use std::sync::Arc;

use wopr_config::AppConfig;
use wopr_memory::{FileStorage, KnowledgeBase};

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

pub(crate) fn open_knowledge(config: &AppConfig) -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::new(FileStorage::in_data_dir(&config.data_dir())))
}

/// Explain how to supply a key. Returns the error to bail out with.
pub(crate) fn missing_key(config: &AppConfig) -> Box<dyn std::error::Error> {
    let vendor_var = match config.ai_provider.as_str() {
        "anthropic" => "ANTHROPIC_API_KEY",
        "gemini" => "GEMINI_API_KEY",
        _ => "OPENAI_API_KEY",
    };
    eprintln!();
    eprintln!("  ERROR: No API key configured for provider '{}'!", config.ai_provider);
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    WOPR_API_KEY       (any provider)");
    eprintln!("    {vendor_var:<18} (this provider)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    wopr_core::ProviderError::MissingApiKey.into()
}
