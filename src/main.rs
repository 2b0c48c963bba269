use std::{fs::File, sync::Arc};

use anyhow::{anyhow, Context, Result};
use is_terminal::IsTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codecrate::{
    cli::{Cli, Command},
    config::Config,
    handlers,
    language::Language,
    printer::TextPrinter,
    service::HttpExecutionService,
    session::SessionController,
    tui,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load config, then let CLI flags win
    let mut cfg = Config::load();
    if let Some(url) = &args.api_url {
        cfg.set("CODECRATE_API_URL", url.as_str());
    }
    if let Some(level) = &args.log_level {
        cfg.set("LOG_LEVEL", level.as_str());
    }
    if let Some(secs) = args.timeout {
        cfg.set("REQUEST_TIMEOUT", secs.to_string());
    }
    let language: Language = match &args.language {
        Some(l) => l.parse()?,
        None => cfg.default_language(),
    };

    let command = args.command.clone().unwrap_or(Command::Tui);
    init_logging(&cfg, matches!(command, Command::Tui))?;
    info!(config = %cfg.config_path.display(), api_url = %cfg.api_url(), "Loaded configuration");

    let service = Arc::new(HttpExecutionService::from_config(&cfg).context("failed to build HTTP client")?);
    let printer = TextPrinter { color: !args.no_color && std::io::stdout().is_terminal() };

    match command {
        Command::Tui => {
            if !std::io::stdin().is_terminal() {
                return Err(anyhow!("the interactive editor needs a terminal; use `codecrate run` instead"));
            }
            let controller = SessionController::new(service, language).with_reprobe(cfg.reprobe_on_execute());
            tui::run_tui(controller, cfg.api_url()).await
        }
        Command::Run { file } => {
            let ok = handlers::run::run(service, language, file.as_deref(), &printer).await?;
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Health => {
            let url = cfg.api_url();
            if !handlers::health::run(service, &url, &printer).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Languages => handlers::languages::run(service.as_ref(), &printer).await,
    }
}

/// Stderr for one-shot commands; a log file for the TUI so the screen stays clean.
fn init_logging(cfg: &Config, tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log_level()));

    if tui {
        let path = std::env::temp_dir().join("codecrate.log");
        let file = File::create(&path).with_context(|| format!("cannot create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
