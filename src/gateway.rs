use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::conversation_log::ConversationLog;
use crate::error::GenerateError;
use crate::ollama::TextGenerator;

#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub generated_text: String,
    pub model: String,
    /// `None` when the exchange could not be stored.
    pub conversation_id: Option<u32>,
}

/// Bridges one prompt to one backend call and records the result.
pub struct Gateway {
    generator: Arc<dyn TextGenerator>,
    log: Arc<ConversationLog>,
    default_prompt: String,
}

impl Gateway {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        log: Arc<ConversationLog>,
        default_prompt: String,
    ) -> Self {
        Self {
            generator,
            log,
            default_prompt,
        }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub async fn backend_reachable(&self) -> bool {
        self.generator.ping().await
    }

    pub async fn generate(&self, prompt: Option<String>) -> Result<Generation, GenerateError> {
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.default_prompt.clone());
        info!("Generating text with prompt: {}...", preview(&prompt, 50));

        let generated_text = match self.generator.generate(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!("Error generating text: {}", e);
                return Err(e);
            }
        };
        info!(
            "Text generated successfully ({} chars)",
            generated_text.chars().count()
        );

        let model = self.model().to_string();
        // Storage failures are already logged by the log itself.
        let conversation_id = self
            .log
            .append(&prompt, &generated_text, &model)
            .ok()
            .map(|record| record.id);

        Ok(Generation {
            generated_text,
            model,
            conversation_id,
        })
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Replays a fixed outcome and remembers the prompts it saw.
    pub(crate) struct ScriptedGenerator {
        pub outcome: Result<String, u16>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                outcome: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                outcome: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.outcome {
                Ok(text) => Ok(text.clone()),
                Err(code) => Err(GenerateError::Backend(
                    reqwest::StatusCode::from_u16(*code).unwrap(),
                )),
            }
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    fn gateway(generator: Arc<ScriptedGenerator>, log: Arc<ConversationLog>) -> Gateway {
        Gateway::new(generator, log, "Hello, how are you?".to_string())
    }

    #[tokio::test]
    async fn trims_and_stores_generation() {
        let dir = tempdir().unwrap();
        let log = Arc::new(ConversationLog::open(dir.path().join("c.json"), 100));
        let gw = gateway(Arc::new(ScriptedGenerator::replying(" Hello! ")), log.clone());

        let generation = gw.generate(Some("Hi".to_string())).await.unwrap();
        assert_eq!(generation.generated_text, "Hello!");
        assert_eq!(generation.model, "test-model");
        assert_eq!(generation.conversation_id, Some(1));

        let stored = log.get(1).unwrap();
        assert_eq!(stored.prompt, "Hi");
        assert_eq!(stored.response, "Hello!");
        assert_eq!(stored.response_length, 6);
    }

    #[tokio::test]
    async fn empty_prompt_uses_default() {
        let dir = tempdir().unwrap();
        let log = Arc::new(ConversationLog::open(dir.path().join("c.json"), 100));
        let generator = Arc::new(ScriptedGenerator::replying("ok"));
        let gw = gateway(generator.clone(), log);

        gw.generate(None).await.unwrap();
        gw.generate(Some("   ".to_string())).await.unwrap();

        let prompts = generator.prompts.lock().unwrap().clone();
        assert_eq!(prompts, vec!["Hello, how are you?", "Hello, how are you?"]);
    }

    #[tokio::test]
    async fn backend_failure_stores_nothing() {
        let dir = tempdir().unwrap();
        let log = Arc::new(ConversationLog::open(dir.path().join("c.json"), 100));
        let gw = gateway(Arc::new(ScriptedGenerator::failing(500)), log.clone());

        let err = gw.generate(Some("Hi".to_string())).await.unwrap_err();
        assert_eq!(err.to_string(), "Ollama API error: 500");
        assert_eq!(log.count(), 0);
    }

    #[tokio::test]
    async fn storage_failure_still_returns_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::create_dir(&path).unwrap();
        let log = Arc::new(ConversationLog::open(path, 100));
        let gw = gateway(Arc::new(ScriptedGenerator::replying("text")), log);

        let generation = gw.generate(Some("Hi".to_string())).await.unwrap();
        assert_eq!(generation.generated_text, "text");
        assert_eq!(generation.conversation_id, None);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("hi", 50), "hi");
    }
}
