//! The live collaborator: edge + LLM behind the core session traits.

use async_trait::async_trait;

use vigil_core::config::{EdgeConfig, LlmConfig};
use vigil_core::error::{AgentError, AgentResult};
use vigil_core::traits::{AgentFactory, AgentSession, CallHandle};

use crate::edge::StreamEdge;
use crate::gemini::GeminiClient;
use crate::prompts;

/// One live agent session against the hosted services.
pub struct LiveAgent {
    edge: StreamEdge,
    llm: GeminiClient,
    system_prompt: String,
    call: Option<CallHandle>,
}

#[async_trait]
impl AgentSession for LiveAgent {
    async fn create_user(&mut self) -> AgentResult<()> {
        self.edge.upsert_user().await
    }

    async fn demo_join_url(&mut self, call_type: &str, call_id: &str) -> AgentResult<String> {
        Ok(self.edge.demo_join_url(call_type, call_id))
    }

    async fn create_call(&mut self, call_type: &str, call_id: &str) -> AgentResult<CallHandle> {
        self.edge.get_or_create_call(call_type, call_id).await
    }

    async fn join(&mut self, call: &CallHandle) -> AgentResult<()> {
        self.edge.join_call(call).await?;
        self.call = Some(call.clone());
        tracing::info!(cid = %call.cid(), "agent joined call");
        Ok(())
    }

    async fn simple_response(&mut self, prompt: &str) -> AgentResult<Option<String>> {
        self.llm.simple_response(&self.system_prompt, prompt).await
    }

    async fn finish(&mut self) -> AgentResult<()> {
        // Idempotent: the driving task also calls this when unwinding.
        if let Some(call) = self.call.take() {
            self.edge.end_call(&call).await?;
            tracing::info!(cid = %call.cid(), "call ended");
        }
        Ok(())
    }
}

/// Builds a [`LiveAgent`] per session from the service configuration.
pub struct LiveAgentFactory {
    edge: EdgeConfig,
    llm: LlmConfig,
}

impl LiveAgentFactory {
    pub fn new(edge: EdgeConfig, llm: LlmConfig) -> Self {
        Self { edge, llm }
    }
}

impl AgentFactory for LiveAgentFactory {
    fn create(&self) -> AgentResult<Box<dyn AgentSession>> {
        if self.edge.api_key.is_empty() {
            return Err(AgentError::Setup(
                "edge api key is not configured (set VIGIL_EDGE_API_KEY)".to_string(),
            ));
        }
        if self.llm.api_key.is_empty() {
            return Err(AgentError::Setup(
                "llm api key is not configured (set VIGIL_LLM_API_KEY)".to_string(),
            ));
        }

        Ok(Box::new(LiveAgent {
            edge: StreamEdge::new(self.edge.clone())?,
            llm: GeminiClient::new(self.llm.clone())?,
            system_prompt: prompts::system_prompt(),
            call: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_requires_credentials() {
        let factory = LiveAgentFactory::new(EdgeConfig::default(), LlmConfig::default());
        let err = factory.create().err().expect("expected create to fail");
        assert!(matches!(err, AgentError::Setup(_)));
        assert!(err.to_string().contains("edge api key"));
    }

    #[test]
    fn factory_builds_with_credentials() {
        let edge = EdgeConfig {
            api_key: "k".into(),
            ..EdgeConfig::default()
        };
        let llm = LlmConfig {
            api_key: "k".into(),
            ..LlmConfig::default()
        };
        assert!(LiveAgentFactory::new(edge, llm).create().is_ok());
    }
}
