use clap::Parser;
use roombot::{
    chat::console::ConsoleChat,
    config::{self, BotConfig},
    program::Program,
    Error, InternalResult,
};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn run(cli: &Cli) -> InternalResult<()> {
    let config: BotConfig = if cli.config.exists() {
        config::from_file(&cli.config)?
    } else {
        info!("{} not found, using default config", cli.config.display());
        BotConfig::default()
    };

    info!("config loaded.");
    debug!("config: {:?}", config);

    let chat = Arc::new(ConsoleChat::stdio(config.site));
    let trigger = config.trigger.clone();
    let mut program = Program::new(chat, config)?;
    program.startup().await?;

    println!(
        "roombot started. Messages starting with {} are commands, try {}help. Press Ctrl+C to quit.",
        trigger, trigger
    );

    let finished = tokio::select! {
        result = program.wait() => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| Error::internal(format!("Failed to wait for Ctrl+C: {}", e)))?;
            None
        }
    };

    match finished {
        Some(result) => result,
        None => {
            println!("Shutdown signal received, performing clean shutdown...");
            program.shutdown().await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    // a pending stdin read would otherwise hold up runtime shutdown
    std::process::exit(code);
}
