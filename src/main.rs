//! voice-concierge: chat + text-to-speech proxy with a daily e-mailed log digest.

mod api;
mod chat;
mod chat_log;
mod config;
mod conversation;
mod digest;
mod error;
mod scheduler;
mod speech;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "voice-concierge", about = "Chat and speech proxy with daily log digest")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (suppress noisy HTTP/SMTP internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info,lettre=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn,lettre=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("voice-concierge starting");

    // .env is optional; real environment variables still apply without it
    if let Err(e) = dotenv::dotenv() {
        info!("No .env loaded: {e}");
    }

    let config = config::Config::load(args.config.as_deref());
    if config.chat.api_key.is_empty() {
        warn!("GROQ_API_KEY is not set, chat requests will be rejected upstream");
    }
    if config.speech.api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set, speech requests will be rejected upstream");
    }

    if config.digest.enabled {
        let missing = config.digest.missing_mail_settings();
        if !missing.is_empty() {
            warn!(
                "Digest enabled but {} not set; digests cannot be delivered",
                missing.join(", ")
            );
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start digest scheduler (background task)
    let scheduler_task = if config.digest.enabled {
        let mailer = Arc::new(digest::SmtpMailer::new(&config.digest)?);
        let scheduler =
            scheduler::DigestScheduler::new(config.digest.clone(), config.log.path.clone(), mailer)?;
        Some(tokio::spawn(scheduler.run(shutdown_rx)))
    } else {
        info!("Digest disabled");
        None
    };

    let state = api::AppState {
        conversation: conversation::Conversation::new(config.chat.system_prompt.clone()),
        chat: Arc::new(chat::ChatClient::new(config.chat.clone())?),
        speech: Arc::new(speech::SpeechSynthesizer::new(config.speech.clone())?),
        log: Arc::new(chat_log::ChatLog::new(config.log.path.clone())),
    };
    info!("Appending exchanges to {}", state.log.path().display());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    };

    api::serve(state, &config.server.host, config.server.port, shutdown).await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = scheduler_task {
        task.await?;
    }

    info!("voice-concierge stopped");
    Ok(())
}
