//! Hosted-LLM client for the conversational turns.
//!
//! One `generateContent` round trip per utterance; the session keeps no
//! server-side conversation state beyond what the system prompt carries.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use vigil_core::config::LlmConfig;
use vigil_core::error::{AgentError, AgentResult};

pub struct GeminiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Setup(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Send one prompt and return the model's text reply, if any.
    pub async fn simple_response(
        &self,
        system: &str,
        prompt: &str,
    ) -> AgentResult<Option<String>> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = json!({
            "system_instruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.trim().is_empty());

        tracing::debug!(
            model = %self.config.model,
            reply = text.as_deref().map(str::len).unwrap_or(0),
            "llm turn complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(LlmConfig {
            api_key: "llm-key".into(),
            model: "gemini-2.0-flash".into(),
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_the_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "llm-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Posture looks " }, { "text": "good." }] }
                }]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .simple_response("be nice", "assess")
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("Posture looks good."));
    }

    #[tokio::test]
    async fn an_empty_candidate_list_is_no_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .simple_response("sys", "anything")
            .await
            .unwrap();
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn non_success_statuses_become_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .simple_response("sys", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Api { status: 429, .. }));
    }
}
