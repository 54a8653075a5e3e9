mod browser_commands;
mod check_commands;
mod config_commands;
mod run_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "autocontinue",
    version,
    about = "Keep a chat assistant generating by sending \"Continue\" whenever it stops"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "AUTOCONTINUE_CONFIG")]
    config: Option<PathBuf>,

    // Run overrides; also accepted before `run`.
    #[command(flatten)]
    run: run_commands::RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat and keep it going (default when no subcommand is given).
    Run(run_commands::RunArgs),
    /// Validate config, selectors and browser availability.
    Check {
        /// Show informational diagnostics too.
        #[arg(long)]
        verbose: bool,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Browser detection and settings.
    Browser {
        #[command(subcommand)]
        action: browser_commands::BrowserAction,
    },
}

/// Initialise tracing. `RUST_LOG` wins over `--log-level`.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Cancel `cancel` on Ctrl-C or SIGTERM.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => info!("received Ctrl-C, shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                },
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("received Ctrl-C, shutting down");
                    }
                },
            }
        }
        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl-C, shutting down");
            }
        }
        cancel.cancel();
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "autocontinue starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        None => run_with_signals(config_path, &cli.run).await,
        Some(Commands::Run(ref args)) => {
            run_with_signals(config_path, &args.merged_over(&cli.run)).await
        },
        Some(_) if cli.run != run_commands::RunArgs::default() => {
            anyhow::bail!("run options such as --url only apply to `autocontinue run`")
        },
        Some(Commands::Check { verbose }) => check_commands::handle_check(config_path, verbose),
        Some(Commands::Config { action }) => config_commands::handle_config(config_path, action),
        Some(Commands::Browser { action }) => browser_commands::handle_browser(config_path, action),
    }
}

async fn run_with_signals(
    config_path: Option<&Path>,
    args: &run_commands::RunArgs,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());
    run_commands::handle_run(config_path, args, cancel).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_runs_with_overrides() {
        let cli = Cli::try_parse_from(["autocontinue", "--interval-ms", "5000", "--headless"])
            .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.interval_ms, Some(5000));
        assert!(cli.run.headless);
    }

    #[test]
    fn run_subcommand_accepts_the_same_flags() {
        let cli = Cli::try_parse_from([
            "autocontinue",
            "run",
            "--connect",
            "http://127.0.0.1:9222",
            "--max-continues",
            "3",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.connect.as_deref(), Some("http://127.0.0.1:9222"));
        assert_eq!(args.max_continues, Some(3));
    }

    #[test]
    fn flags_before_run_are_kept() {
        let cli = Cli::try_parse_from([
            "autocontinue",
            "--url",
            "https://chat.example.com/",
            "run",
            "--interval-ms",
            "4000",
        ])
        .unwrap();
        let Some(Commands::Run(ref args)) = cli.command else {
            panic!("expected run");
        };
        let effective = args.merged_over(&cli.run);
        assert_eq!(effective.url.as_deref(), Some("https://chat.example.com/"));
        assert_eq!(effective.interval_ms, Some(4000));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "autocontinue",
            "check",
            "--verbose",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Check { verbose: true })));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
