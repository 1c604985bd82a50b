//! `wopr analyze`: Describe a screenshot in character.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use wopr_core::message::Message;
use wopr_providers::build_from_config;

use super::{load_config, missing_key, open_knowledge};

pub async fn run(image: &Path, context: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    if !config.has_api_key() {
        return Err(missing_key(&config));
    }

    let bytes = tokio::fs::read(image)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", image.display()))?;
    let image_base64 = STANDARD.encode(&bytes);

    let knowledge = open_knowledge(&config).text().await?;
    let mut prompt_context = config.prompt_context().with_knowledge(knowledge);
    if let Some(recent) = context.filter(|c| !c.trim().is_empty()) {
        prompt_context = prompt_context.with_recent_messages(vec![Message::user(recent)]);
    }

    let router = build_from_config(&config);
    let analysis = router
        .analyze_screen(
            &config.provider_config(),
            &image_base64,
            &prompt_context,
            &config.vision_options(),
        )
        .await?;

    for line in analysis.lines() {
        println!("  {line}");
    }
    Ok(())
}
