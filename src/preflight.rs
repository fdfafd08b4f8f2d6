// file: src/preflight.rs
// description: single-call connectivity check against the model gateway

use crate::error::{AgentError, Result};
use crate::gateway::{ChatMessage, ChatModel, ChatRequest};
use crate::prompts;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const SUCCESS_MARKER: &str = "MODEL WORKING";

#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub model: String,
    pub reply: String,
    pub elapsed: Duration,
}

/// Sends one prompt and checks the reply carries the success marker.
pub async fn check(chat: &dyn ChatModel) -> Result<PreflightReport> {
    info!("Running preflight against {}", chat.model());
    let start = Instant::now();

    let request = ChatRequest::new(vec![ChatMessage::user(prompts::PREFLIGHT)]);
    let reply = chat.complete(&request).await?;
    let elapsed = start.elapsed();
    debug!("Preflight reply: {:?}", reply);

    if !reply_confirms(&reply) {
        return Err(AgentError::malformed(
            "preflight",
            format!(
                "expected a reply containing '{}', got: {:?}",
                SUCCESS_MARKER,
                reply.trim()
            ),
        ));
    }

    Ok(PreflightReport {
        model: chat.model().to_string(),
        reply,
        elapsed,
    })
}

pub fn reply_confirms(reply: &str) -> bool {
    reply.trim().to_uppercase().contains(SUCCESS_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeChat {
        reply: Result<String>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl FakeChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl ChatModel for FakeChat {
        fn model(&self) -> &str {
            "fake/model"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(AgentError::from_code(
                    "OpenRouter",
                    401,
                    "User not found.",
                    "regenerate the key",
                )),
            }
        }
    }

    #[test]
    fn test_reply_confirms() {
        assert!(reply_confirms("MODEL WORKING"));
        assert!(reply_confirms("  model working.\n"));
        assert!(!reply_confirms("MODEL READY"));
        assert!(!reply_confirms("Hello!"));
    }

    #[tokio::test]
    async fn test_check_sends_single_user_message() {
        let chat = FakeChat::replying("MODEL WORKING");
        let report = check(&chat).await.unwrap();

        assert_eq!(report.model, "fake/model");
        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[0].messages[0].content, prompts::PREFLIGHT);
    }

    #[tokio::test]
    async fn test_check_rejects_unexpected_reply() {
        let chat = FakeChat::replying("I am a helpful assistant.");
        let err = check(&chat).await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_check_surfaces_auth_error() {
        let chat = FakeChat {
            reply: Err(AgentError::Validation("unused".to_string())),
            seen: Mutex::new(vec![]),
        };
        let err = check(&chat).await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.hint().is_some());
    }
}
