use std::sync::Arc;

use crate::config::Config;
use crate::conversation_log::ConversationLog;
use crate::gateway::Gateway;
use crate::ollama::{OllamaClient, TextGenerator};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub log: Arc<ConversationLog>,
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let ollama = Arc::new(OllamaClient::from_config(&config)?);
        Ok(Self::with_generator(config, ollama))
    }

    /// Wires the components around an already-built backend client.
    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let log = Arc::new(ConversationLog::open(
            config.conversations_file.clone(),
            config.max_conversations,
        ));
        let gateway = Arc::new(Gateway::new(
            generator,
            log.clone(),
            config.default_prompt.clone(),
        ));

        Self {
            config: Arc::new(config),
            log,
            gateway,
        }
    }
}
