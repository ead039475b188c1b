//! Fallback chain decorator.
//!
//! Composes a primary client with an ordered list of alternates. An
//! invocation that fails on the primary is retried on each alternate in
//! turn; the last failure is surfaced if the whole chain is exhausted.
//! Mid-stream failures are not retried — by then fragments may already have
//! reached the consumer.

use crate::ports::chat_model::{Binding, ChatModel, ModelError, TokenStream};
use async_trait::async_trait;
use counsel_domain::Message;
use std::sync::Arc;
use tracing::debug;

pub struct FallbackModel {
    primary: Arc<dyn ChatModel>,
    alternates: Vec<Arc<dyn ChatModel>>,
}

impl FallbackModel {
    pub fn new(primary: Arc<dyn ChatModel>, alternates: Vec<Arc<dyn ChatModel>>) -> Self {
        Self {
            primary,
            alternates,
        }
    }
}

#[async_trait]
impl ChatModel for FallbackModel {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError> {
        let mut last_error = match self.primary.invoke(messages).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };
        for alternate in &self.alternates {
            debug!(model = alternate.name(), "falling back after: {last_error}");
            match alternate.invoke(messages).await {
                Ok(text) => return Ok(text),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, ModelError> {
        let mut last_error = match self.primary.stream(messages).await {
            Ok(stream) => return Ok(stream),
            Err(e) => e,
        };
        for alternate in &self.alternates {
            debug!(model = alternate.name(), "falling back after: {last_error}");
            match alternate.stream(messages).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    fn rebind(&self, binding: Binding) -> Result<Arc<dyn ChatModel>, ModelError> {
        let primary = self.primary.rebind(binding.clone())?;
        let alternates = self
            .alternates
            .iter()
            .map(|a| a.rebind(binding.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(FallbackModel {
            primary,
            alternates,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ScriptedModel {
        name: String,
        reply: Option<String>,
    }

    impl ScriptedModel {
        fn ok(name: &str, reply: &str) -> Arc<dyn ChatModel> {
            Arc::new(Self {
                name: name.to_string(),
                reply: Some(reply.to_string()),
            })
        }

        fn failing(name: &str) -> Arc<dyn ChatModel> {
            Arc::new(Self {
                name: name.to_string(),
                reply: None,
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(&self, _messages: &[Message]) -> Result<String, ModelError> {
            self.reply.clone().ok_or(ModelError::Timeout)
        }

        async fn stream(&self, _messages: &[Message]) -> Result<TokenStream, ModelError> {
            let reply = self.reply.clone().ok_or(ModelError::Timeout)?;
            let (tx, rx) = mpsc::channel(1);
            tx.send(Ok(reply)).await.unwrap();
            Ok(TokenStream::new(rx))
        }

        fn rebind(&self, _binding: Binding) -> Result<Arc<dyn ChatModel>, ModelError> {
            Ok(Arc::new(Self {
                name: self.name.clone(),
                reply: self.reply.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn primary_success_skips_alternates() {
        let chain = FallbackModel::new(
            ScriptedModel::ok("primary", "from primary"),
            vec![ScriptedModel::ok("alt", "from alt")],
        );
        let text = chain.invoke(&[Message::user("hi")]).await.unwrap();
        assert_eq!(text, "from primary");
    }

    #[tokio::test]
    async fn alternates_are_tried_in_order() {
        let chain = FallbackModel::new(
            ScriptedModel::failing("primary"),
            vec![
                ScriptedModel::failing("alt-1"),
                ScriptedModel::ok("alt-2", "from alt-2"),
            ],
        );
        let text = chain.invoke(&[Message::user("hi")]).await.unwrap();
        assert_eq!(text, "from alt-2");
    }

    #[tokio::test]
    async fn exhausted_chain_surfaces_the_last_error() {
        let chain = FallbackModel::new(
            ScriptedModel::failing("primary"),
            vec![ScriptedModel::failing("alt")],
        );
        assert!(chain.invoke(&[Message::user("hi")]).await.is_err());
    }

    #[tokio::test]
    async fn stream_falls_back_on_initial_failure() {
        let chain = FallbackModel::new(
            ScriptedModel::failing("primary"),
            vec![ScriptedModel::ok("alt", "안녕하세요")],
        );
        let stream = chain.stream(&[Message::user("안녕")]).await.unwrap();
        assert_eq!(stream.collect_text().await.unwrap(), "안녕하세요");
    }
}
