//! Translation branch of the pipeline.

use std::sync::Arc;

use crate::error::PixiError;
use crate::language::Language;
use crate::llm::{ChatModel, ChatRequest};

const SYSTEM_INSTRUCTION: &str = "You are a translation assistant.";

/// A completed translation.
#[derive(Debug, Clone)]
pub struct Translation {
    pub language: Language,
    pub content: String,
}

pub struct Translator {
    model: Arc<dyn ChatModel>,
}

impl Translator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Translate `text` into `language`.
    ///
    /// The `none` sentinel short-circuits: no prompt is built and the model is
    /// never invoked. Otherwise exactly one completion call is made and the
    /// reply is returned verbatim.
    pub async fn translate(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Option<Translation>, PixiError> {
        if language.is_none() {
            return Ok(None);
        }

        let prompt = format!("Translate the following text into {}:\n\n{}", language, text);

        let reply = self
            .model
            .complete(&ChatRequest {
                system: SYSTEM_INSTRUCTION.to_string(),
                user: prompt,
            })
            .await?;

        tracing::debug!(language = %language, tokens = reply.tokens_used, "Translation completed");

        Ok(Some(Translation {
            language,
            content: reply.content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatReply;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: &'static str,
        fail: bool,
        calls: AtomicUsize,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl ScriptedModel {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply,
                fail: false,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: "",
                fail: true,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, PixiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.fail {
                return Err(PixiError::Model("connection refused".to_string()));
            }
            Ok(ChatReply {
                content: self.reply.to_string(),
                model: "scripted".to_string(),
                tokens_used: 0,
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn none_sentinel_skips_the_model() {
        let model = Arc::new(ScriptedModel::replying("should never be seen"));
        let translator = Translator::new(model.clone());

        let result = translator.translate("hello", Language::None).await.unwrap();

        assert!(result.is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prompt_names_the_language_and_carries_the_text() {
        let model = Arc::new(ScriptedModel::replying("Bonjour le Monde"));
        let translator = Translator::new(model.clone());

        let result = translator
            .translate("Hello World", Language::French)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.content, "Bonjour le Monde");
        assert_eq!(result.language, Language::French);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let request = model.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.system, "You are a translation assistant.");
        assert!(request.user.contains("French"));
        assert!(request.user.contains("Hello World"));
        assert_eq!(
            request.user,
            "Translate the following text into French:\n\nHello World"
        );
    }

    #[tokio::test]
    async fn model_failure_surfaces_as_api_error() {
        let model = Arc::new(ScriptedModel::failing());
        let translator = Translator::new(model);

        let err = translator
            .translate("Hello World", Language::German)
            .await
            .unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("❌"));
        assert!(rendered.contains("Error"));
    }
}
