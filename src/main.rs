use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use postsweep::{
    config::{AgentConfig, format_duration},
    keepalive::{HttpPinger, KeepAlive},
    observability,
    remote::{ResourceClient, TwitterClient},
    resources::{ResourceStore, RetentionPolicy},
    scheduler::{Scheduler, SweepOptions},
    server::{self, ListenerHandle},
};
use tokio_util::sync::CancellationToken;

/// CLI arguments for postsweep
#[derive(Parser, Debug)]
#[command(version, about = "Deletes posts once they reach a configured age", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a TOML config file. Without one, configuration is read from
    /// environment variables (PORT, HEROKU_NAME, TWITTER_ACCESS_TOKEN,
    /// TWITTER_USER_ID, TWEETSTORIES_MAX_AGE)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the scheduler and the health listener until terminated (default)
    Serve,
    /// Validate the configuration and print a summary
    Check,
    /// Run a single refresh and sweep, then exit
    Once {
        /// Log what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Check => run_check(&config),
        Command::Once { dry_run } => run_once(config, dry_run).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> AgentConfig {
    let result = match path {
        Some(path) => AgentConfig::from_file(path),
        None => AgentConfig::from_env(),
    };

    match result {
        Ok(config) => config,
        Err(e) => {
            match path {
                Some(path) => eprintln!("Failed to load config from {}: {}", path.display(), e),
                None => eprintln!("Failed to load config from environment: {}", e),
            }
            std::process::exit(1);
        }
    }
}

fn init_observability(config: &AgentConfig) {
    if let Err(e) = observability::init_tracing(&config.observability.logging) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = observability::metrics::init_metrics(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to initialize metrics: {e}");
    }
}

fn build_client(config: &AgentConfig) -> Arc<dyn ResourceClient> {
    match TwitterClient::new(&config.remote) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create API client");
            std::process::exit(1);
        }
    }
}

fn build_scheduler(config: &AgentConfig, options: SweepOptions) -> Scheduler {
    Scheduler::new(
        ResourceStore::new(),
        build_client(config),
        RetentionPolicy::from_std(config.retention.max_age),
    )
    .with_sweep_options(options)
}

async fn run_server(config: AgentConfig) {
    init_observability(&config);

    tracing::info!(
        user_id = %config.remote.user_id,
        max_age = %format_duration(config.retention.max_age),
        "Starting postsweep"
    );

    let bind_addr = config.server.bind_addr();
    let listener = match ListenerHandle::bind(&bind_addr, server::router()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start HTTP listener");
            std::process::exit(1);
        }
    };

    let mut scheduler = build_scheduler(&config, SweepOptions::from_config(&config.retention))
        .with_listener(listener, config.server.shutdown_grace());

    match HttpPinger::from_config(&config.keepalive, reqwest::Client::new()) {
        Some(pinger) => {
            tracing::info!(target_url = %pinger.target(), "Keep-alive enabled");
            scheduler = scheduler.with_pinger(Arc::new(pinger) as Arc<dyn KeepAlive>);
        }
        None => tracing::info!("Keep-alive disabled"),
    }

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    scheduler.run(cancel).await;
    tracing::info!("Shutdown complete");
}

fn run_check(config: &AgentConfig) {
    println!("Configuration OK");
    println!("  listen:        {}", config.server.bind_addr());
    println!("  api:           {}", config.remote.base_url);
    println!("  user:          {}", config.remote.user_id);
    println!(
        "  max age:       {}",
        format_duration(config.retention.max_age)
    );
    println!("  dry run:       {}", config.retention.dry_run);
    match config.retention.delete_limit() {
        Some(limit) => println!("  delete limit:  {} per sweep", limit),
        None => println!("  delete limit:  unlimited"),
    }
    match (config.keepalive.enabled, config.keepalive.target()) {
        (true, Some(target)) => println!("  keep-alive:    {}", target),
        _ => println!("  keep-alive:    disabled"),
    }
}

async fn run_once(config: AgentConfig, dry_run: bool) {
    init_observability(&config);

    let mut options = SweepOptions::from_config(&config.retention);
    options.dry_run |= dry_run;
    let mut scheduler = build_scheduler(&config, options);

    let refresh = match scheduler.refresh().await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Refresh failed: {}", e);
            std::process::exit(1);
        }
    };
    let sweep = scheduler.sweep().await;

    println!("listed:   {}", refresh.listed);
    println!("expired:  {}", sweep.expired);
    println!("deleted:  {}", sweep.deleted);
    println!("failed:   {}", sweep.failed);
    println!("skipped:  {}", sweep.skipped);

    if sweep.failed > 0 {
        std::process::exit(2);
    }
}

/// Cancel `cancel` on Ctrl+C or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining...");
    cancel.cancel();
}
