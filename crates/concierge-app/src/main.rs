//! Concierge terminal client - composition root.
//!
//! 1. Load configuration from TOML, then apply CLI and env overrides
//! 2. Build the content store from a directory, a URL or the built-ins
//! 3. Restore the session id and language preference
//! 4. Wire the dialogue engine to the backend (or run offline)
//! 5. Read commands from stdin until /quit, EOF or Ctrl-C

mod cli;
mod commands;
mod terminal;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use concierge_content::{
    ContentSource, ContentStore, FilePreferences, FsContentSource, HttpContentSource,
    LanguageResolver, StaticContentSource,
};
use concierge_core::config::{expand_home, ConciergeConfig};
use concierge_dialogue::{
    DialogueEngine, HttpInteractionLog, HttpResponder, InteractionLog, NoopInteractionLog,
    OfflineResponder, Outcome, Presenter, Responder,
};

use cli::CliArgs;
use commands::Command;
use terminal::{OutputFormat, TerminalSurface};

fn content_source(
    config: &ConciergeConfig,
    timeout: Duration,
) -> Result<Arc<dyn ContentSource>, Box<dyn std::error::Error>> {
    if let Some(ref url) = config.content.content_url {
        tracing::info!(url = %url, "Serving content over HTTP");
        return Ok(Arc::new(HttpContentSource::new(url.clone(), timeout)?));
    }
    if let Some(ref dir) = config.content.content_dir {
        let dir = expand_home(dir);
        tracing::info!(path = %dir.display(), "Serving content from directory");
        return Ok(Arc::new(FsContentSource::new(dir)));
    }
    tracing::info!("No content source configured, using built-in strings only");
    Ok(Arc::new(StaticContentSource::new()))
}

fn backend(
    config: &ConciergeConfig,
    timeout: Duration,
) -> Result<(Arc<dyn Responder>, Arc<dyn InteractionLog>), Box<dyn std::error::Error>> {
    let Some(ref base_url) = config.backend.base_url else {
        tracing::info!("No backend configured, free-text questions will get an apology");
        return Ok((Arc::new(OfflineResponder), Arc::new(NoopInteractionLog)));
    };

    let responder: Arc<dyn Responder> = Arc::new(HttpResponder::new(base_url, timeout)?);
    let log: Arc<dyn InteractionLog> = if config.backend.logging_enabled {
        Arc::new(HttpInteractionLog::new(base_url, timeout)?)
    } else {
        Arc::new(NoopInteractionLog)
    };
    tracing::info!(url = %base_url, logging = config.backend.logging_enabled, "Backend configured");
    Ok((responder, log))
}

/// Run one command. Engine calls are spawned so that input typed while an
/// exchange is in flight reaches the engine and is ignored there.
fn dispatch(engine: &Arc<DialogueEngine>, command: Command) -> bool {
    let engine = Arc::clone(engine);
    match command {
        Command::Quit => return false,
        Command::Empty => {}
        Command::Help => eprintln!("{}", commands::HELP),
        Command::Unknown(line) => eprintln!("Unknown command {line:?}. Type /help."),
        Command::Choose(index) => {
            tokio::spawn(async move { report(engine.choose(index).await) });
        }
        Command::Reply(reply) => {
            tokio::spawn(async move { report(engine.quick_reply(reply).await) });
        }
        Command::Language(language) => {
            tokio::spawn(async move { report(engine.set_language(language).await) });
        }
        Command::Text(text) => {
            tokio::spawn(async move { report(engine.submit_text(&text).await) });
        }
    }
    true
}

fn report(outcome: Outcome) {
    tracing::debug!(?outcome, "Exchange finished");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ConciergeConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing goes to stderr; stdout is the conversation.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting concierge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let timeout = Duration::from_secs(config.backend.request_timeout_secs);

    // Content.
    let store = Arc::new(ContentStore::new(content_source(&config, timeout)?));
    if let Err(e) = store.menu().validate() {
        tracing::error!(error = %e, "Menu tree is inconsistent");
        return Err(e.into());
    }

    // Session and language.
    let data_dir = config.data_dir();
    let prefs = Arc::new(FilePreferences::in_dir(&data_dir));
    tracing::info!(path = %prefs.path().display(), "Session preferences");
    let resolver = Arc::new(LanguageResolver::new(
        Arc::clone(&store),
        prefs,
        config.general.default_language,
    ));
    match args.resolve_language() {
        Some(language) if language != resolver.current_language() => {
            resolver.set_language(language).await;
        }
        _ => resolver.load_current().await,
    }

    // Engine.
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let surface = Arc::new(TerminalSurface::stdout(format));
    let presenter = Arc::new(Presenter::new(surface, config.timing.reveal_tick()));
    let (responder, log) = backend(&config, timeout)?;
    let engine = Arc::new(DialogueEngine::new(
        resolver,
        presenter,
        responder,
        log,
        config.timing.clone(),
    ));

    {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { report(engine.start().await) });
    }

    // Input loop.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !dispatch(&engine, commands::parse(&line)) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read input");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    engine.shutdown();
    tracing::info!(session_id = %engine.session_id(), "Concierge stopped");
    Ok(())
}
