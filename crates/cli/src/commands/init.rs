//! `wopr init`: First-time setup.

use wopr_config::AppConfig;
use wopr_memory::FileStorage;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("WOPR — First-Time Setup");
    println!("=======================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run init.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load_from(&config_path)?;
    let knowledge = FileStorage::in_data_dir(&config.data_dir());
    if let Some(brain) = knowledge.path().parent() {
        std::fs::create_dir_all(brain)?;
        println!("  Knowledge lives in: {}", knowledge.path().display());
    }

    println!("\n  Next steps:");
    println!("   1. Add your API key to {} (or set WOPR_API_KEY)", config_path.display());
    println!("   2. Run: wopr chat");
    println!("\n  SHALL WE PLAY A GAME?\n");

    Ok(())
}
