//! # WOPR Persona
//!
//! Builds system prompts from a [`SystemPromptContext`]. Two templates exist,
//! selected by [`Preset`]: the retro WOPR terminal and the cozy companion.
//!
//! Both functions are pure. Optional sections are appended in a fixed order
//! and only when they carry content.

mod cozy;
mod retro;

use wopr_core::message::Role;
use wopr_core::persona::{Preset, SystemPromptContext};

pub use retro::GAMES;

/// Build the chat system prompt.
///
/// Appends the knowledge block (when its trimmed text is non-empty) and then
/// the screen-context block (when non-empty).
pub fn build_system_prompt(ctx: &SystemPromptContext) -> String {
    let (mut prompt, knowledge_header, screen_header) = match ctx.preset {
        Preset::Retro => (
            retro::system_prompt(&ctx.persona_name, &ctx.user_name),
            retro::KNOWLEDGE_HEADER,
            retro::SCREEN_HEADER,
        ),
        Preset::Cozy => (
            cozy::system_prompt(&ctx.persona_name, &ctx.user_name),
            cozy::KNOWLEDGE_HEADER,
            cozy::SCREEN_HEADER,
        ),
    };

    if let Some(knowledge) = non_blank(ctx.knowledge_text.as_deref()) {
        push_section(&mut prompt, knowledge_header, knowledge);
    }

    if let Some(screen) = ctx.screen_context.as_deref().filter(|s| !s.is_empty()) {
        push_section(&mut prompt, screen_header, screen);
    }

    prompt
}

/// Build the shorter prompt used when analyzing a screenshot.
///
/// Appends the knowledge block, then one `"<speaker>: <content>"` line per
/// recent message. The speaker is the user's name for user turns and the
/// persona's name otherwise.
pub fn build_screen_analysis_prompt(ctx: &SystemPromptContext) -> String {
    let (mut prompt, knowledge_header, recent_header) = match ctx.preset {
        Preset::Retro => (
            retro::screen_analysis_prompt(&ctx.persona_name, &ctx.user_name),
            retro::screen_knowledge_header(&ctx.user_name),
            retro::RECENT_HEADER,
        ),
        Preset::Cozy => (
            cozy::screen_analysis_prompt(&ctx.persona_name, &ctx.user_name),
            cozy::screen_knowledge_header(&ctx.user_name),
            cozy::RECENT_HEADER,
        ),
    };

    if let Some(knowledge) = non_blank(ctx.knowledge_text.as_deref()) {
        push_section(&mut prompt, &knowledge_header, knowledge);
    }

    if !ctx.recent_messages.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(recent_header);
        prompt.push('\n');
        for msg in &ctx.recent_messages {
            let speaker = match msg.role {
                Role::User => &ctx.user_name,
                _ => &ctx.persona_name,
            };
            prompt.push_str(speaker);
            prompt.push_str(": ");
            prompt.push_str(msg.text());
            prompt.push('\n');
        }
    }

    prompt
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

fn push_section(prompt: &mut String, header: &str, body: &str) {
    prompt.push_str("\n\n");
    prompt.push_str(header);
    prompt.push('\n');
    prompt.push_str(body);
}
