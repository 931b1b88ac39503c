use std::path::PathBuf;

use clap::Parser;

use local_agent::lifecycle::{self, signals, Shutdown, StartupOptions};

#[derive(Parser)]
#[command(name = "local-agent")]
#[command(about = "Runs inputs and outputs from configuration files on disk", long_about = None)]
struct Cli {
    /// Main configuration file
    #[arg(short, long, default_value = "agent.toml")]
    config: PathBuf,

    /// Directory holding capabilities and external inputs
    #[arg(long)]
    path_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::wait_for_shutdown().await;
            shutdown.trigger();
        });
    }

    lifecycle::run(
        StartupOptions {
            config_file: cli.config,
            config_dir: cli.path_config,
        },
        shutdown,
    )
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
