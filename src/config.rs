use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Ollama server, without a trailing `/api`.
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_conversations_file")]
    pub conversations_file: PathBuf,
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model_name() -> String {
    "llama3.2:3b".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_conversations_file() -> PathBuf {
    PathBuf::from("/data/conversations.json")
}

fn default_max_conversations() -> usize {
    100
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    180
}

fn default_prompt() -> String {
    "Hello, how are you?".to_string()
}

impl Config {
    /// Layers an optional config file (`CONFIG_PATH`) and then the process
    /// environment over the built-in defaults.
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("CONFIG_PATH") {
            tracing::debug!("Reading config file {}", path);
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        let settings = builder
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("Failed to assemble configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_conversations == 0 {
            anyhow::bail!("max_conversations must be at least 1");
        }
        if self.ollama_host.trim().is_empty() {
            anyhow::bail!("ollama_host cannot be empty");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.bind_address, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_host: default_ollama_host(),
            model_name: default_model_name(),
            bind_address: default_bind_address(),
            port: default_port(),
            conversations_file: default_conversations_file(),
            max_conversations: default_max_conversations(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            default_prompt: default_prompt(),
        }
    }
}
