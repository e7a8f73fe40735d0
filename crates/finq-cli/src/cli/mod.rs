//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use finq_core::config;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "finq")]
#[command(version = "0.1")]
#[command(about = "Terminal personal finance tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with username/password or the hosted federated flow
    Login {
        /// Account email
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Account password (or FINQ_PASSWORD)
        #[arg(long, short = 'p', env = "FINQ_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Use the hosted federated sign-in flow (browser + pasted callback)
        #[arg(long, conflicts_with_all = ["username", "password"])]
        federated: bool,
    },

    /// Sign out and clear cached credentials
    Logout,

    /// Register a new account
    Signup {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password (or FINQ_PASSWORD)
        #[arg(long, env = "FINQ_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Confirm a pending sign-up with the emailed code
    Confirm {
        /// Account email
        #[arg(long)]
        email: String,

        /// Verification code from the email
        #[arg(long)]
        code: String,
    },

    /// Show the current session
    Status,

    /// List a collection as JSON
    List {
        /// Collection name: transactions, budgets, reports, dashboard, or profile
        #[arg(value_name = "COLLECTION")]
        collection: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands work without a complete config
    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let _log_guard = init_logging();

    let config = config::Config::load().context("load config")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    // default to the interactive TUI
    let Some(command) = cli.command else {
        // The TUI loop is synchronous; spawned effects need the runtime
        let _enter = rt.enter();
        return finq_tui::run_interactive(config);
    };

    rt.block_on(async move {
        match command {
            Commands::Login {
                username,
                password,
                federated,
            } => {
                if federated {
                    commands::auth::login_federated(&config).await
                } else {
                    let (Some(username), Some(password)) = (username, password) else {
                        anyhow::bail!(
                            "Provide --username and --password, or use --federated"
                        );
                    };
                    commands::auth::login(&config, &username, &password).await
                }
            }
            Commands::Logout => commands::auth::logout(&config).await,
            Commands::Signup { email, password } => {
                commands::auth::signup(&config, &email, &password).await
            }
            Commands::Confirm { email, code } => {
                commands::auth::confirm(&config, &email, &code).await
            }
            Commands::Status => commands::auth::status(&config).await,
            Commands::List { collection } => {
                commands::collections::list(&config, &collection).await
            }
            Commands::Config { .. } => unreachable!("handled above"),
        }
    })
}

/// Routes log output to ${FINQ_HOME}/logs; the terminal stays clean for the
/// TUI. Level comes from FINQ_LOG (default: info for finq crates).
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = config::paths::logs_dir();
    std::fs::create_dir_all(&logs_dir).ok()?;

    let filter = std::env::var("FINQ_LOG")
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("finq=info,finq_core=info,finq_tui=info"));

    let appender = tracing_appender::rolling::daily(logs_dir, "finq.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Some(guard)
}
