//! Funil Digital - a terminal admin console for sales funnels.
//!
//! Runs the keyboard-driven dashboard by default. `--login`, `--logout` and
//! `--whoami` manage the stored session from the shell without the TUI.

mod app;
mod ui;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use funil_core::auth::{MemoryTokenStore, Session, TokenStore};
use funil_core::config::Config;
use funil_core::ApiClient;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the cache directory
const LOG_FILE_NAME: &str = "funil.log";

const USAGE: &str = "\
Uso: funil [OPÇÕES]

Opções:
  --login      Entrar pelo terminal e guardar o token
  --logout     Encerrar a sessão guardada
  --whoami     Mostrar o operador conectado
  --ephemeral  Manter o token só em memória (nada é gravado)
  -h, --help   Mostrar esta mensagem

Ambiente:
  FUNIL_API_URL   URL base do backend (padrão http://localhost:5000/api)
  FUNIL_EMAIL     Email pré-preenchido no login
  FUNIL_PASSWORD  Senha pré-preenchida no login
  RUST_LOG        Filtro de log (padrão warn)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tui,
    Login,
    Logout,
    Whoami,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    command: Command,
    ephemeral: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = CliArgs {
            command: Command::Tui,
            ephemeral: false,
        };
        for arg in args {
            let command = match arg.as_str() {
                "--login" => Command::Login,
                "--logout" => Command::Logout,
                "--whoami" => Command::Whoami,
                "-h" | "--help" => Command::Help,
                "--ephemeral" => {
                    parsed.ephemeral = true;
                    continue;
                }
                other => bail!("Argumento desconhecido: {}\n\n{}", other, USAGE),
            };
            if parsed.command != Command::Tui {
                bail!("Use apenas um entre --login, --logout e --whoami");
            }
            parsed.command = command;
        }
        Ok(parsed)
    }
}

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Shell commands log to stderr
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// The TUI owns the terminal, so it logs to a daily file in the cache
/// directory. The guard must live until exit to flush buffered lines.
fn init_file_tracing() -> Option<WorkerGuard> {
    let dir = Config::cache_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = CliArgs::parse(&args)?;

    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let _guard = if cli.command == Command::Tui {
        init_file_tracing()
    } else {
        init_stderr_tracing();
        None
    };

    let config = Config::load_or_default().with_env_overrides();
    let store: Arc<dyn TokenStore> = if cli.ephemeral {
        Arc::new(MemoryTokenStore::new())
    } else {
        config.token_store()?
    };

    match cli.command {
        Command::Login => cli_login(config, store).await,
        Command::Logout => cli_logout(config, store).await,
        Command::Whoami => cli_whoami(config, store).await,
        Command::Tui | Command::Help => run_tui(config, store).await,
    }
}

// ============================================================================
// Shell commands
// ============================================================================

fn session_for(config: &Config, store: Arc<dyn TokenStore>) -> Result<Session> {
    let api = ApiClient::new(config.api_base_url(), store, config.request_timeout())?;
    Ok(Session::new(api))
}

/// Read a line from stdin, falling back to `default` when it is left blank
fn prompt_line(prompt: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("{} [{}]: ", prompt, default),
        None => print!("{}: ", prompt),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    Ok(match (line.is_empty(), default) {
        (true, Some(default)) => default.to_string(),
        _ => line.to_string(),
    })
}

async fn cli_login(config: Config, store: Arc<dyn TokenStore>) -> Result<()> {
    let mut session = session_for(&config, store)?;

    let email = prompt_line("Email", config.last_email.as_deref())?;
    let password = match config.prefill_password.clone() {
        Some(password) => password,
        None => rpassword::prompt_password("Senha: ")?,
    };

    println!("Autenticando em {}...", config.api_base_url());
    session
        .login(&email, &password)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    if let Err(e) = Config::remember_email(email.trim()) {
        warn!(error = %e, "Failed to save config");
    }
    if let Some(user) = session.current_user() {
        println!("{}", user.greeting());
    }
    Ok(())
}

async fn cli_logout(config: Config, store: Arc<dyn TokenStore>) -> Result<()> {
    let mut session = session_for(&config, store)?;
    session.logout().await;
    println!("Sessão encerrada");
    Ok(())
}

async fn cli_whoami(config: Config, store: Arc<dyn TokenStore>) -> Result<()> {
    let mut session = session_for(&config, store)?;
    if session.restore().await {
        if let Some(user) = session.current_user() {
            println!("{} <{}>", user.greeting(), user.email);
        }
    } else {
        println!("Nenhuma sessão ativa");
    }
    Ok(())
}

// ============================================================================
// Terminal UI
// ============================================================================

async fn run_tui(config: Config, store: Arc<dyn TokenStore>) -> Result<()> {
    info!(base_url = config.api_base_url(), "Funil Digital starting");

    let mut app = App::new(config, store)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The loading screen stays up while the stored token is checked
    app.begin_restore();
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Erro: {}", e);
    }

    info!("Funil Digital shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Apply results from finished fetches
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_runs_tui() {
        let cli = CliArgs::parse(&[]).unwrap();
        assert_eq!(cli.command, Command::Tui);
        assert!(!cli.ephemeral);
    }

    #[test]
    fn test_flags() {
        let cli = CliArgs::parse(&args(&["--ephemeral", "--whoami"])).unwrap();
        assert_eq!(cli.command, Command::Whoami);
        assert!(cli.ephemeral);

        assert_eq!(CliArgs::parse(&args(&["-h"])).unwrap().command, Command::Help);
        assert_eq!(CliArgs::parse(&args(&["--logout"])).unwrap().command, Command::Logout);
    }

    #[test]
    fn test_rejects_unknown_and_conflicting_flags() {
        let err = CliArgs::parse(&args(&["--verbose"])).unwrap_err();
        assert!(err.to_string().starts_with("Argumento desconhecido: --verbose"));
        assert!(CliArgs::parse(&args(&["--login", "--logout"])).is_err());
    }
}
