//! Chat-completion client for OpenAI-compatible `/chat/completions` APIs.
//!
//! Sends the whole transcript every call and asks for a single choice.
//! No retries; any upstream failure goes straight back to the caller.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ChatConfig;
use crate::conversation::Message;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct ChatClient {
    config: ChatConfig,
    client: Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    /// Request one reply for the given transcript.
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "n": 1,
        });

        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        debug!("Sending {} messages to chat model '{}'", messages.len(), self.config.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                service: "chat",
                status,
                body,
            });
        }

        let data: CompletionResponse = resp.json().await?;
        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(Error::EmptyReply)
    }
}
