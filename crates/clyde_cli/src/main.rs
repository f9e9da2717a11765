use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use clyde_behavior::{BehaviorPipeline, Session};
use clyde_core::ClydeConfig;
use clyde_runtime::{ConsoleTransport, Dispatcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "clyde.toml")]
    config: PathBuf,

    /// Directory holding chains, subscriptions and fact stores
    #[arg(short, long, env = "CLYDE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Seed for the random source, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.json_logs);

    let mut config = ClydeConfig::load_or_default(&args.config);
    if let Some(dir) = args.data_dir {
        config.runtime.data_dir = Some(dir);
    }
    if args.seed.is_some() {
        config.runtime.seed = args.seed;
    }

    info!("Waking up {} in {}", config.identity.name, config.data_dir().display());
    let session = Session::load(&config, Utc::now())?;
    let pipeline = BehaviorPipeline::with_seed_rules(&config.identity.name)
        .context("Failed to compile behavior rules")?;
    info!(
        "Loaded {} chain keys, {} subscriptions, {} rules",
        session.chain.len(),
        session.subs.len(),
        pipeline.rules().len()
    );

    let console = Arc::new(ConsoleTransport::stdout(&config));
    let handle = Dispatcher::new(&config, session, pipeline, console.clone()).spawn();

    println!(
        "{} is listening on {}. Type lines as `channel/instance sender: text`, or just text. 'quit' to exit.",
        config.identity.name, config.identity.home_channel
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = console.read_lines(stdin, &handle) => {
            result?;
            handle.flush().await?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    handle.shutdown().await?;
    info!("Goodbye");
    Ok(())
}
