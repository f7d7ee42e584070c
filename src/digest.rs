//! Daily chat-log digest: read the log, render it as HTML, mail it, clear it.
//!
//! Truncation is not tied to delivery. The log is cleared after every
//! send attempt that returns, successful or not, so a failed send drops
//! that day's entries.
//!
//! A run that fails before the send (missing log file, unset or invalid
//! sender/receiver) returns the error and leaves the log untouched, so it
//! keeps growing until the mail settings are fixed.

use std::path::Path;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::DigestConfig;
use crate::error::{Error, Result};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

/// STARTTLS SMTP relay with login credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &DigestConfig) -> Result<Self> {
        let creds = Credentials::new(config.sender.clone(), config.api_key.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| Error::Mail(format!("invalid relay {}: {e}", config.smtp_host)))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: Message) -> Result<()> {
        // The transport only closes connections it managed to open.
        self.transport
            .send(message)
            .await
            .map_err(|e| Error::Mail(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct DigestOutcome {
    pub lines: usize,
    pub html: String,
    pub sent: bool,
}

/// Read every line of the log, without terminators. A missing file is an error.
pub async fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(contents.lines().map(str::to_owned).collect())
}

/// Wrap each line in a paragraph. Lines are inserted verbatim.
pub fn render_html(lines: &[String]) -> String {
    let mut html = String::from("<html><body>");
    for line in lines {
        html.push_str("<p>");
        html.push_str(line);
        html.push_str("</p>");
    }
    html.push_str("</body></html>");
    html
}

pub fn build_message(config: &DigestConfig, html: String) -> Result<Message> {
    let from: Mailbox = config
        .sender
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("sender address {:?}: {e}", config.sender)))?;
    let to: Mailbox = config
        .receiver
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("receiver address {:?}: {e}", config.receiver)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(config.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(html)
        .map_err(|e| Error::Mail(format!("failed to build digest: {e}")))
}

/// One digest run: read → render → send → truncate.
pub async fn run_digest(config: &DigestConfig, log_path: &Path, mailer: &dyn Mailer) -> Result<DigestOutcome> {
    let lines = read_log_lines(log_path).await?;
    let html = render_html(&lines);
    let message = build_message(config, html.clone())?;

    let sent = match mailer.send(message).await {
        Ok(()) => {
            info!("Digest sent to {} ({} lines)", config.receiver, lines.len());
            true
        }
        Err(e) => {
            error!("Error sending digest: {e}");
            false
        }
    };

    tokio::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(log_path)
        .await?;
    info!("Chat log {} cleared", log_path.display());

    Ok(DigestOutcome {
        lines: lines.len(),
        html,
        sent,
    })
}
