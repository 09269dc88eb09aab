use anyhow::Context;
use clap::Parser;
use captiond::cli::{log_directives, Cli, Commands};
use captiond::types::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let (mut config, load_error) = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(config) => (config, None),
            Err(e) => (Config::default_config(), Some(e)),
        }
    } else {
        (Config::default_config(), None)
    };
    config
        .apply_env()
        .context("invalid environment override")?;

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        config.general.tracing_level().unwrap_or("info")
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in log_directives(log_level) {
        filter = filter.add_directive(directive.parse().context("invalid log directive")?);
    }

    let registry = tracing_subscriber::registry().with(filter);
    if config.general.json_logs() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    if let Some(e) = load_error {
        tracing::warn!(
            path = %cli.config.display(),
            error = %e,
            "Could not load configuration, using defaults"
        );
    }
    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Serve { host, port } => {
            config.validate().context("invalid configuration")?;
            captiond::cli::commands::serve(host, port, config).await?;
        }
        Commands::Caption { urls } => {
            config.validate().context("invalid configuration")?;
            captiond::cli::commands::caption(urls, config).await?;
        }
        Commands::Init { path } => {
            captiond::cli::commands::init(path).await?;
        }
        Commands::Config => {
            captiond::cli::commands::config_cmd(&cli.config, &config).await?;
        }
        Commands::Version => {
            captiond::cli::commands::version();
        }
    }

    Ok(())
}
