//! Speech synthesis through an OpenAI-compatible `/audio/speech` API.
//!
//! The returned MP3 is written to one fixed file and read back for the
//! response. Every call overwrites the same path, so concurrent requests
//! race on it (last writer wins). The file is never cleaned up.

use std::path::Path;

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::SpeechConfig;
use crate::error::{Error, Result};

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

pub struct SpeechSynthesizer {
    config: SpeechConfig,
    client: Client,
}

impl SpeechSynthesizer {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    pub fn output_path(&self) -> &Path {
        &self.config.output_path
    }

    /// Synthesize `text`, store it at the output path and return the file bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let body = json!({
            "model": self.config.model,
            "voice": self.config.voice,
            "input": text,
        });

        let url = format!("{}/audio/speech", self.config.api_base.trim_end_matches('/'));
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
                service: "speech",
                status,
                body,
            });
        }

        let audio = resp.bytes().await?;
        tokio::fs::write(&self.config.output_path, &audio).await?;
        debug!(
            "Wrote {} bytes of audio to {}",
            audio.len(),
            self.output_path().display()
        );

        Ok(tokio::fs::read(&self.config.output_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn synthesizer(server: &MockServer, dir: &tempfile::TempDir) -> SpeechSynthesizer {
        SpeechSynthesizer::new(SpeechConfig {
            api_base: format!("{}/v1", server.uri()),
            api_key: "sk-test".into(),
            model: "tts-1".into(),
            voice: "alloy".into(),
            output_path: dir.path().join("output.mp3"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn writes_audio_to_fixed_file_and_returns_it() {
        let server = MockServer::start().await;
        let audio: Vec<u8> = vec![0xFF, 0xFB, 0x90, 0x64, 0x00, 0x01];
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(bearer_token("sk-test"))
            .and(body_json(json!({"model": "tts-1", "voice": "alloy", "input": "hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", AUDIO_CONTENT_TYPE)
                    .set_body_bytes(audio.clone()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, &dir);
        let bytes = synth.synthesize("hello").await.unwrap();

        assert_eq!(bytes, audio);
        assert_eq!(std::fs::read(synth.output_path()).unwrap(), audio);
    }

    #[tokio::test]
    async fn later_call_overwrites_earlier_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"model": "tts-1", "voice": "alloy", "input": "long"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 64]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!({"model": "tts-1", "voice": "alloy", "input": "short"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 4]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, &dir);
        synth.synthesize("long").await.unwrap();
        synth.synthesize("short").await.unwrap();

        assert_eq!(std::fs::read(synth.output_path()).unwrap(), vec![2u8; 4]);
    }

    #[tokio::test]
    async fn upstream_failure_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, &dir);
        let err = synth.synthesize("hello").await.unwrap_err();

        assert!(matches!(err, Error::Upstream { service: "speech", .. }));
        assert!(!synth.output_path().exists());
    }
}
