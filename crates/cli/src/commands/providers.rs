//! `wopr providers`: List supported LLM providers and models.

use std::io::Write;

use wopr_core::ProviderKind;
use wopr_providers::{all_providers, build_from_config, provider_info};

use super::{load_config, missing_key};

pub async fn run(test: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    println!("Supported LLM Providers");
    println!("=======================");
    for info in all_providers() {
        let active = if info.kind.tag() == config.ai_provider { " (active)" } else { "" };
        println!();
        println!("  {} [{}]{active}", info.display_name, info.kind.tag());
        for model in info.models {
            let default = if model.id == info.default_model { ", default" } else { "" };
            let search = if info.search_models.contains(&model.id) { ", web search" } else { "" };
            println!("    {:<28} {}{default}{search}", model.id, model.label);
        }
    }
    println!();
    println!("  Environment variables:");
    println!("    WOPR_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY");
    println!("    WOPR_PROVIDER, WOPR_MODEL");

    if let Some(note) = uncatalogued_model_note(&config.ai_provider, &config.ai_model) {
        println!();
        println!("  Note: {note}");
    }

    if test {
        if !config.has_api_key() {
            return Err(missing_key(&config));
        }
        let router = build_from_config(&config);
        println!();
        print!("  Testing {} / {} ... ", config.ai_provider, config.ai_model);
        std::io::stdout().flush()?;
        if router.test_connection(&config.provider_config()).await {
            println!("OK");
        } else {
            println!("FAILED (run with -v for details)");
        }
    }

    Ok(())
}

/// A note for a configured model the catalog doesn't list. The request is
/// still sent as-is; the provider decides whether the model exists.
fn uncatalogued_model_note(provider: &str, model: &str) -> Option<String> {
    let kind = provider.parse::<ProviderKind>().ok()?;
    let info = provider_info(kind);
    if info.has_model(model) {
        return None;
    }
    Some(format!(
        "{model} is not a listed {} model (default: {})",
        info.display_name, info.default_model
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_model_has_no_note() {
        assert_eq!(uncatalogued_model_note("openai", "gpt-4o-mini"), None);
        assert_eq!(uncatalogued_model_note("gemini", "gemini-1.5-flash"), None);
    }

    #[test]
    fn unlisted_model_gets_note() {
        let note = uncatalogued_model_note("anthropic", "claude-2").unwrap();
        assert!(note.starts_with("claude-2 is not a listed Anthropic model"));
    }

    #[test]
    fn unknown_provider_is_left_to_the_router() {
        assert_eq!(uncatalogued_model_note("grok", "grok-1"), None);
    }
}
