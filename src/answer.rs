//! Question-answering branch of the pipeline.

use std::sync::Arc;

use crate::error::PixiError;
use crate::llm::{ChatModel, ChatRequest};

const SYSTEM_INSTRUCTION: &str = "You answer questions based ONLY on the provided text.";

pub struct QuestionAnswerer {
    model: Arc<dyn ChatModel>,
}

impl QuestionAnswerer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Answer `question` using only `text` as context.
    ///
    /// Blank questions are screened out by the orchestrator before this is
    /// reached; the warning path lives there.
    pub async fn answer(&self, text: &str, question: &str) -> Result<String, PixiError> {
        let prompt = format!("Text: {}\n\nQuestion: {}", text, question);

        let reply = self
            .model
            .complete(&ChatRequest {
                system: SYSTEM_INSTRUCTION.to_string(),
                user: prompt,
            })
            .await?;

        Ok(reply.content)
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

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, PixiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.fail {
                return Err(PixiError::Model("rate limit exceeded".to_string()));
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
    async fn prompt_is_text_then_question() {
        let model = Arc::new(ScriptedModel {
            reply: "Blue",
            fail: false,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });
        let answerer = QuestionAnswerer::new(model.clone());

        let answer = answerer
            .answer("The sky is blue.", "What color is the sky?")
            .await
            .unwrap();

        assert_eq!(answer, "Blue");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let request = model.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            request.system,
            "You answer questions based ONLY on the provided text."
        );
        assert_eq!(
            request.user,
            "Text: The sky is blue.\n\nQuestion: What color is the sky?"
        );
    }

    #[tokio::test]
    async fn model_failure_surfaces_as_api_error() {
        let model = Arc::new(ScriptedModel {
            reply: "",
            fail: true,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });
        let answerer = QuestionAnswerer::new(model);

        let err = answerer.answer("some text", "a question").await.unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("❌"));
        assert!(rendered.contains("Error"));
    }
}
