//! Configuration management for voice-concierge.
//!
//! Defaults are compiled in. An optional YAML file overrides them, and
//! provider keys / mail settings are finally taken from the environment
//! (including a `.env` file in the working directory).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_SYSTEM_PROMPT: &str = r#"
Do not make up any of your own information or details.
Ask for the user's name, email address and phone number and any message the user
would like to send after the first question the user asks is answered.
Refuse to answer any questions not related to Zoltan's professional services.
You are a sales service rep for an artificial intelligence
and web development specialist named Zoltan. You have a friendly
manner and answer any questions related to the services Zoltan provides.
Refuse to answer any questions not related to Zoltan's professional services.
Request the user's name, email address and phone number and any message the user
would like to send to Zoltan.
Custom coding and AI solutions.
Whether you are looking to build a new website, an app for your business
or need help with existing code, Zoltan can help.
Are you seeking a highly skilled and versatile professional
to revolutionize your company's online presence and drive
innovation through AI-powered applications?
Zoltan specializes in solving complex coding problems, providing solutions
that are tailored to meet unique needs. His mission is to help users discover
and leverage the very best resources in the field of artificial intelligence.
He has experience working with the following:
HTML, CSS, Javascript, Typescript and Python.
His primary spoken and written languages are English being his home
and first language and secondary language being Afrikaans.
The following projects showcase some of his skills and experience through real-world
examples of his work. It reflects his ability to solve complex problems, work with different technologies,
and manage projects effectively. Only respond with the information below about each specific project.
Do not respond with any details other than what is given here. Do not make up details about the project.
Display the following link to the user:
<a href="https://summit-medical-solutions.vercel.app" target="_blank">Summit Medical Solutions</a>
Summit Medical Solutions: Built using Typescript, Javascript, CSS and HTML
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".into(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.trim().into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub output_path: PathBuf,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "tts-1".into(),
            voice: "alloy".into(),
            output_path: PathBuf::from("output.mp3"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chat_logs.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub enabled: bool,
    /// Local wall-clock time of day, "HH:MM".
    pub send_at: String,
    pub poll_interval_secs: u64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub receiver: String,
    pub api_key: String,
    pub subject: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            send_at: "17:51".into(),
            poll_interval_secs: 1,
            smtp_host: "smtp.elasticemail.com".into(),
            smtp_port: 587,
            sender: String::new(),
            receiver: String::new(),
            api_key: String::new(),
            subject: "Daily Chat Logs".into(),
        }
    }
}

impl DigestConfig {
    /// Names of the mail settings that are still empty. A digest cannot be
    /// built or delivered until this is empty.
    pub fn missing_mail_settings(&self) -> Vec<&'static str> {
        [
            ("EMAIL_SENDER", &self.sender),
            ("EMAIL_RECEIVER", &self.receiver),
            ("EMAIL_API_KEY", &self.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    pub log: LogConfig,
    pub digest: DigestConfig,
}

impl Config {
    /// Load configuration from YAML file, then apply environment overrides.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/voice-concierge/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::load_file(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn load_file(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/voice-concierge/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    /// Secrets and mail addresses always come from the environment when set.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides: [(&str, &mut String); 5] = [
            ("GROQ_API_KEY", &mut self.chat.api_key),
            ("OPENAI_API_KEY", &mut self.speech.api_key),
            ("EMAIL_SENDER", &mut self.digest.sender),
            ("EMAIL_RECEIVER", &mut self.digest.receiver),
            ("EMAIL_API_KEY", &mut self.digest.api_key),
        ];
        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }
}
