use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use elasticspot_core::config::{Config, ENV_REGION};
use elasticspot_core::event::{CloudWatchEvent, ReconcileRequest};
use elasticspot_core::handler::Handler;
use elasticspot_core::response::ReconcileResult;
use elasticspot_provider_aws::AwsEc2;

#[derive(Parser)]
#[command(name = "elasticspot")]
#[command(
    about = "Keep an elastic IP associated with the instance named by an event",
    long_about = None
)]
struct Cli {
    /// Elastic IP to keep associated (overrides ELASTIC_IP)
    #[arg(long, global = true)]
    elastic_ip: Option<String>,

    /// AWS region (overrides AWS_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle an EventBridge instance state-change event
    Handle {
        /// Path to the event JSON, or - for stdin
        #[arg(default_value = "-")]
        event: PathBuf,
    },
    /// Associate the elastic IP with an instance directly
    Associate {
        /// EC2 instance ID
        #[arg(long)]
        instance_id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.elastic_ip.as_deref(), cli.region)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            signal_token.cancel();
        }
    });

    let api = AwsEc2::new(config.region.as_deref()).await;
    let mut config = config;
    if config.region.is_none() {
        config.region = api.region().map(String::from);
    }
    tracing::info!(
        elastic_ip = %config.elastic_ip,
        region = config.region.as_deref().unwrap_or("unknown"),
        "elasticspot starting"
    );
    let handler = Handler::new(api, &config);

    let result = match cli.command {
        Commands::Handle { event: path } => {
            let bytes = read_event(&path).await?;
            let event = CloudWatchEvent::from_slice(&bytes)
                .with_context(|| format!("Failed to decode event from {}", path.display()))?;
            handler.handle(&event, &cancel).await?
        }
        Commands::Associate { instance_id } => {
            handler
                .handle_request(&ReconcileRequest::new(instance_id), &cancel)
                .await?
        }
    };

    print_result(&result)
}

fn load_config(elastic_ip: Option<&str>, region: Option<String>) -> anyhow::Result<Config> {
    let config = match elastic_ip {
        Some(ip) => Config::new(ip, std::env::var(ENV_REGION).ok())?,
        None => Config::from_env()?,
    };
    Ok(match region {
        Some(region) => config.with_region(region),
        None => config,
    })
}

async fn read_event(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("Failed to read event from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn print_result(result: &ReconcileResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{}", json);
    Ok(())
}
