//! Provider registry: the static catalog of providers and their models.
//!
//! Adapters consult it to decide whether a web-search request can be honored
//! and whether the temperature field must be left out.

use wopr_core::provider::ProviderKind;

/// One selectable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub label: &'static str,
}

/// Catalog entry for one provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderInfo {
    pub kind: ProviderKind,
    pub display_name: &'static str,
    pub models: &'static [ModelInfo],
    pub default_model: &'static str,
    /// Models that accept web-search augmentation.
    pub search_models: &'static [&'static str],
}

impl ProviderInfo {
    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.id == model)
    }
}

static OPENAI: ProviderInfo = ProviderInfo {
    kind: ProviderKind::OpenAi,
    display_name: "OpenAI",
    models: &[
        ModelInfo { id: "gpt-4o", label: "GPT-4o" },
        ModelInfo { id: "gpt-4o-mini", label: "GPT-4o Mini" },
        ModelInfo { id: "gpt-4-turbo", label: "GPT-4 Turbo" },
        ModelInfo { id: "gpt-3.5-turbo", label: "GPT-3.5 Turbo" },
    ],
    default_model: "gpt-4o-mini",
    search_models: &["gpt-4o", "gpt-4o-mini"],
};

static ANTHROPIC: ProviderInfo = ProviderInfo {
    kind: ProviderKind::Anthropic,
    display_name: "Anthropic",
    models: &[
        ModelInfo { id: "claude-sonnet-4-20250514", label: "Claude Sonnet 4" },
        ModelInfo { id: "claude-3-5-sonnet-20241022", label: "Claude 3.5 Sonnet" },
        ModelInfo { id: "claude-3-5-haiku-20241022", label: "Claude 3.5 Haiku" },
        ModelInfo { id: "claude-3-opus-20240229", label: "Claude 3 Opus" },
    ],
    default_model: "claude-sonnet-4-20250514",
    search_models: &[
        "claude-sonnet-4-20250514",
        "claude-3-5-sonnet-20241022",
        "claude-3-5-haiku-20241022",
    ],
};

static GEMINI: ProviderInfo = ProviderInfo {
    kind: ProviderKind::Gemini,
    display_name: "Google Gemini",
    models: &[
        ModelInfo { id: "gemini-2.0-flash", label: "Gemini 2.0 Flash" },
        ModelInfo { id: "gemini-1.5-pro", label: "Gemini 1.5 Pro" },
        ModelInfo { id: "gemini-1.5-flash", label: "Gemini 1.5 Flash" },
        ModelInfo { id: "gemini-1.0-pro", label: "Gemini 1.0 Pro" },
    ],
    default_model: "gemini-1.5-flash",
    search_models: &["gemini-2.0-flash", "gemini-1.5-pro", "gemini-1.5-flash"],
};

/// Suffix of the OpenAI model variants that perform web search.
pub const SEARCH_PREVIEW_SUFFIX: &str = "-search-preview";

pub fn provider_info(kind: ProviderKind) -> &'static ProviderInfo {
    match kind {
        ProviderKind::OpenAi => &OPENAI,
        ProviderKind::Anthropic => &ANTHROPIC,
        ProviderKind::Gemini => &GEMINI,
    }
}

pub fn all_providers() -> [&'static ProviderInfo; 3] {
    [&OPENAI, &ANTHROPIC, &GEMINI]
}

pub fn supports_web_search(kind: ProviderKind, model: &str) -> bool {
    provider_info(kind).search_models.contains(&model)
}

/// Search-preview variants reject the temperature parameter.
pub fn omits_temperature(model: &str) -> bool {
    model.ends_with(SEARCH_PREVIEW_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_models_are_in_catalog() {
        for info in all_providers() {
            assert!(info.has_model(info.default_model), "{}", info.display_name);
        }
    }

    #[test]
    fn search_models_are_in_catalog() {
        for info in all_providers() {
            for model in info.search_models {
                assert!(info.has_model(model), "{model}");
            }
        }
    }

    #[test]
    fn web_search_support_is_per_model() {
        assert!(supports_web_search(ProviderKind::OpenAi, "gpt-4o-mini"));
        assert!(!supports_web_search(ProviderKind::OpenAi, "gpt-3.5-turbo"));
        assert!(!supports_web_search(ProviderKind::Anthropic, "claude-3-opus-20240229"));
        assert!(!supports_web_search(ProviderKind::Gemini, "gemini-1.0-pro"));
        assert!(!supports_web_search(ProviderKind::Gemini, "gpt-4o"));
    }

    #[test]
    fn search_preview_models_omit_temperature() {
        assert!(omits_temperature("gpt-4o-search-preview"));
        assert!(!omits_temperature("gpt-4o"));
    }

    #[test]
    fn defaults_match_app_defaults() {
        assert_eq!(provider_info(ProviderKind::OpenAi).default_model, "gpt-4o-mini");
        assert_eq!(provider_info(ProviderKind::Gemini).default_model, "gemini-1.5-flash");
    }
}
