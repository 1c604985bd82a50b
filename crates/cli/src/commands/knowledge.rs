//! `wopr knowledge`: Inspect and edit persistent knowledge.

use super::{load_config, open_knowledge};

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let knowledge = open_knowledge(&config);
    let entries = knowledge.entries().await?;

    if entries.is_empty() {
        println!("  Nothing remembered yet.");
        return Ok(());
    }

    println!("  {} remembers:", config.persona_name);
    for (i, entry) in entries.iter().enumerate() {
        println!("  {:>3}. {entry}", i + 1);
    }
    Ok(())
}

pub async fn add(fact: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    if open_knowledge(&config).add(fact).await? {
        println!("  Remembered: {}", fact.trim());
    } else {
        println!("  Already known (or empty): {}", fact.trim());
    }
    Ok(())
}

pub async fn forget(keyword: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    if open_knowledge(&config).remove(keyword).await? {
        println!("  Forgot: {}", keyword.trim());
    } else {
        println!("  No entries contain \"{}\".", keyword.trim());
    }
    Ok(())
}

pub async fn clear(confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        println!("  This will forget EVERYTHING permanently.");
        println!("  Run with --confirm to proceed:");
        println!("    wopr knowledge clear --confirm");
        return Ok(());
    }

    let config = load_config()?;
    open_knowledge(&config).clear().await?;
    println!("  All knowledge cleared.");
    Ok(())
}
