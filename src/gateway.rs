use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, instrument};

use crate::error::GatewayError;
use crate::ideas::normalize_ideas;
use crate::intent::classify_intent;
use crate::llm_interaction::CompletionService;
use crate::model::{ChatResponse, Conversation, Intent, Turn};

/// Stateless relay between a conversation and the completion service.
pub struct Gateway {
    completion: Arc<dyn CompletionService>,
    system_prompt: String,
}

impl Gateway {
    pub fn new(completion: Arc<dyn CompletionService>, system_prompt: impl Into<String>) -> Self {
        Self {
            completion,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn provider(&self) -> &str {
        self.completion.name()
    }

    pub fn model(&self) -> &str {
        self.completion.model()
    }

    #[instrument(skip(self, turns), fields(turns = turns.len()))]
    pub async fn handle(&self, turns: Vec<Turn>) -> Result<ChatResponse, GatewayError> {
        let conversation = Conversation::new(turns)?;
        let outbound = conversation.with_instruction(&self.system_prompt);

        let completion = self
            .completion
            .complete(&outbound)
            .await
            .map_err(GatewayError::GenerationFailed)?;

        if completion.trim().is_empty() {
            return Err(GatewayError::GenerationFailed(anyhow!(
                "Completion service returned an empty completion"
            )));
        }

        let response = shape_completion(&completion);
        info!(intent = ?response.intent, ideas = response.ideas.len(), "Shaped completion");
        Ok(response)
    }
}

/// Classify a raw completion and normalize it into the reply envelope.
pub fn shape_completion(completion: &str) -> ChatResponse {
    match classify_intent(completion) {
        Intent::Save => {
            debug!("Completion carried the save sentinel");
            ChatResponse::save()
        }
        _ => ChatResponse::generate(normalize_ideas(completion)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    struct StubCompletion {
        reply: Result<String, String>,
        calls: Mutex<Vec<Vec<Turn>>>,
    }

    impl StubCompletion {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<Turn>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CompletionService for StubCompletion {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        fn complete<'a>(&'a self, turns: &'a [Turn]) -> BoxFuture<'a, anyhow::Result<String>> {
            self.calls.lock().unwrap().push(turns.to_vec());
            let reply = self.reply.clone().map_err(|e| anyhow!(e));
            Box::pin(async move { reply })
        }
    }

    #[tokio::test]
    async fn test_empty_conversation_makes_no_call() {
        let stub = StubCompletion::replying("unused");
        let gateway = Gateway::new(stub.clone(), "rules");

        let err = gateway.handle(Vec::new()).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_system_prompt_is_prepended() {
        let stub = StubCompletion::replying("An idea.");
        let gateway = Gateway::new(stub.clone(), "rules");

        gateway.handle(vec![Turn::user("go")]).await.unwrap();

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![Turn::system("rules"), Turn::user("go")]);
    }

    #[tokio::test]
    async fn test_sentinel_becomes_save_without_content() {
        let gateway = Gateway::new(StubCompletion::replying("SAVE_INTENT"), "rules");

        let response = gateway.handle(vec![Turn::user("save it")]).await.unwrap();

        assert_eq!(response, ChatResponse::save());
    }

    #[tokio::test]
    async fn test_numbered_completion_becomes_idea_list() {
        let gateway = Gateway::new(
            StubCompletion::replying("1. First idea\n2. Second idea"),
            "rules",
        );

        let response = gateway.handle(vec![Turn::user("ideas")]).await.unwrap();

        assert_eq!(response.intent, Intent::Generate);
        assert_eq!(response.ideas, vec!["First idea", "Second idea"]);
        assert_eq!(response.content.as_deref(), Some("First idea\n\nSecond idea"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_generation_failed() {
        let gateway = Gateway::new(StubCompletion::failing("connection reset"), "rules");

        let err = gateway.handle(vec![Turn::user("ideas")]).await.unwrap_err();

        assert!(matches!(err, GatewayError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_blank_completion_is_generation_failed() {
        let gateway = Gateway::new(StubCompletion::replying("  \n "), "rules");

        let err = gateway.handle(vec![Turn::user("ideas")]).await.unwrap_err();

        assert!(matches!(err, GatewayError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_identical_input_gives_identical_output() {
        let gateway = Gateway::new(StubCompletion::replying(r#"["A","B"]"#), "rules");
        let turns = vec![Turn::user("same")];

        let first = gateway.handle(turns.clone()).await.unwrap();
        let second = gateway.handle(turns).await.unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_generate_is_never_empty() {
        for text in ["x", "[]", "\"\"", "1. ", "a\n\nb"] {
            let response = shape_completion(text);
            assert!(!response.ideas.is_empty(), "empty ideas for {:?}", text);
        }
    }
}
