use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use permctl::cli::{Cli, Commands};
use permctl::commands::{self, confirm_on_stdin};
use permctl::config::Config;
use permctl::gateway::{ConsoleGateway, MemoryGateway};
use permctl::tui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    if let Some(locale) = &cli.locale {
        config.locale = locale.clone();
    }
    config.validate()?;

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "permctl=info");
    }
    // The TUI owns the terminal, so it only logs to the file
    let interactive = matches!(cli.command, Commands::Tui { .. });
    init_logging(&config.log_file, !interactive);

    if let Err(e) = run(cli, config).await {
        error!("permctl failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(log_file: &Path, to_stderr: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("permctl.log"));
    let file_appender = tracing_appender::rolling::never(directory, file_name);

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let locale = config.load_locale()?;

    match &cli.command {
        Commands::Tui { demo } => {
            let gateway: Arc<dyn ConsoleGateway> = if *demo {
                info!("Launching TUI with demo data");
                Arc::new(MemoryGateway::seeded())
            } else {
                info!("Launching TUI against {}", config.server_url);
                Arc::new(commands::connect(&config).await?)
            };
            tui::run_tui(gateway, locale, config.lookup_debounce()).await
        }

        Commands::Permissions(command) => {
            let gateway = Arc::new(commands::connect(&config).await?);
            let mut stdout = io::stdout();
            let mut confirm = confirm_on_stdin;
            commands::run_permissions(gateway, locale, command, &mut stdout, &mut confirm).await
        }

        Commands::Users(command) => {
            let gateway = Arc::new(commands::connect(&config).await?);
            let mut stdout = io::stdout();
            let mut confirm = confirm_on_stdin;
            commands::run_users(gateway, locale, command, &mut stdout, &mut confirm).await
        }

        Commands::Apps => {
            let gateway = Arc::new(commands::connect(&config).await?);
            commands::run_apps(gateway, &mut io::stdout()).await
        }
    }
}
