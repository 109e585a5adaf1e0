// ocr-translate - translate the text found in uploaded images

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use ocr_translate::{Config, Orchestrator, Providers, Result, server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "OCR uploaded images and publish their translations", long_about = None)]
struct Args {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Receive Pub/Sub push deliveries over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: std::net::IpAddr,
    },

    /// Process a single base64-encoded storage event and print the outcome
    Process {
        /// Base64 payload
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        payload: Option<String>,

        /// Read the base64 payload from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A local .env is optional; deployed instances get real environment variables
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    let default_filter = if args.verbose {
        "ocr_translate=debug,tower_http=debug,info"
    } else {
        "ocr_translate=info,warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = Arc::new(Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?);
    tracing::info!(
        project = %config.project_id,
        topic = %config.result_topic,
        languages = ?config.target_languages,
        "Configuration loaded"
    );

    let providers = Providers::google_cloud(&config).inspect_err(|e| {
        tracing::error!(error = %e, "Failed to create API clients");
    })?;
    let orchestrator = Arc::new(Orchestrator::new(config, providers));

    match args.command {
        Command::Serve { port, host } => {
            server::serve(orchestrator, SocketAddr::new(host, port)).await?;
        }
        Command::Process { payload, file } => {
            let payload = match (payload, file) {
                (Some(payload), _) => payload,
                (None, Some(path)) => std::fs::read_to_string(&path).inspect_err(|e| {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read payload");
                })?,
                (None, None) => Args::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "either a payload or --file is required",
                    )
                    .exit(),
            };

            let outcome = orchestrator.handle_event(payload.trim().as_bytes()).await?;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
