//! `wopr chat`: Interactive or single-message chat mode.
//!
//! Replies stream to the terminal as they arrive; memory directives are
//! applied once the reply is complete. Ctrl+C cancels the reply in flight.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use wopr_config::{AppConfig, ConfigProfileStore};
use wopr_core::ProviderKind;
use wopr_memory::MemoryInterpreter;
use wopr_providers::{build_from_config, supports_web_search};

use super::{load_config, missing_key, open_knowledge};
use crate::session::{ChatSession, Reply};

pub async fn run(
    message: Option<String>,
    stream: bool,
    search: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    // Check for API key early; give a clear error
    if !config.has_api_key() {
        return Err(missing_key(&config));
    }

    let provider_config = config.provider_config();
    let router = build_from_config(&config);
    let provider = router.provider(&provider_config)?;

    let mut options = config.chat_options();
    options.web_search |= search;
    if options.web_search && !supports_web_search(provider.kind(), &provider_config.model) {
        eprintln!(
            "  Note: {} does not support web search; continuing without it.",
            provider_config.model
        );
    }

    let memory = MemoryInterpreter::new(open_knowledge(&config))
        .with_profile(Arc::new(ConfigProfileStore::new(AppConfig::config_path())));
    let kind = provider.kind();
    let mut session = ChatSession::new(
        provider,
        &provider_config.model,
        config.prompt_context(),
        options,
        memory,
    );

    if let Some(msg) = message {
        // Single message mode
        turn(&mut session, &msg, stream).await?;
        return Ok(());
    }

    banner(&config, kind);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    loop {
        // Ctrl+C at the prompt leaves the session like `exit` does.
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            prompt()?;
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        if let Err(e) = turn(&mut session, input, stream).await {
            eprintln!("  [Error] {e}");
            println!();
        }

        // The reply may have taught us the user's name.
        if let Ok(latest) = AppConfig::load_from(&AppConfig::config_path()) {
            if let Some(name) = latest.user_name.filter(|n| !n.trim().is_empty()) {
                session.set_user_name(name);
            }
        }

        prompt()?;
    }

    println!();
    println!("  A STRANGE GAME. THE ONLY WINNING MOVE IS NOT TO PLAY.");
    println!();

    Ok(())
}

async fn turn(
    session: &mut ChatSession,
    input: &str,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    session.options_mut().cancel = cancel.clone();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let mut streamed = String::new();
    let result = if stream {
        print!("  ");
        std::io::stdout().flush()?;
        let mut on_delta = |delta: &str| {
            streamed.push_str(delta);
            print!("{}", delta.replace('\n', "\n  "));
            let _ = std::io::stdout().flush();
        };
        session.send_streaming(input, &mut on_delta).await
    } else {
        eprint!("  ...");
        let result = session.send(input).await;
        eprint!("\r     \r");
        result
    };
    watcher.abort();

    let Reply { text, actions } = match result {
        Ok(reply) => reply,
        Err(e) if cancel.is_cancelled() => {
            warn!(error = %e, "Reply cancelled");
            println!();
            println!("  [cancelled]");
            println!();
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if stream {
        println!();
        // The stream showed the directives; repeat the reply without them.
        if streamed.trim() != text {
            println!();
            print_reply(&text);
        }
    } else {
        print_reply(&text);
    }

    for action in &actions {
        println!("  [memory] {action}");
    }
    println!();
    Ok(())
}

fn print_reply(text: &str) {
    for line in text.lines() {
        println!("  {line}");
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  > ");
    std::io::stdout().flush()
}

fn banner(config: &AppConfig, kind: ProviderKind) {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          WOPR — Interactive Session          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Persona:   {} ({})", config.persona_name, config.preset());
    println!("  Provider:  {}", kind.vendor());
    println!("  Model:     {}", config.ai_model);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit. Ctrl+C stops a reply.");
    println!();
}
