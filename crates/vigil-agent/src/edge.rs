//! REST client for the video edge.
//!
//! Covers the slice of the edge API the agent session needs: upserting the
//! agent's user, getting-or-creating the call, announcing the join,
//! marking the call ended, and building the hosted demo URL the human
//! participant opens. The actual media plane (WebRTC) belongs to the
//! vendor clients and never touches this process.

use std::time::Duration;

use serde_json::json;

use vigil_core::config::EdgeConfig;
use vigil_core::error::{AgentError, AgentResult};
use vigil_core::traits::CallHandle;

const EDGE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StreamEdge {
    client: reqwest::Client,
    config: EdgeConfig,
}

impl StreamEdge {
    pub fn new(config: EdgeConfig) -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(EDGE_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Setup(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Ensure the agent's user identity exists on the edge.
    pub async fn upsert_user(&self) -> AgentResult<()> {
        let url = format!("{}/api/v2/users", self.config.base_url);
        let body = json!({
            "users": {
                &self.config.agent_user_id: {
                    "id": self.config.agent_user_id,
                    "name": self.config.agent_user_name,
                    "role": "admin",
                }
            }
        });
        self.post(&url, body).await.map(|_| ())
    }

    /// Get-or-create the call and hand back its handle.
    pub async fn get_or_create_call(
        &self,
        call_type: &str,
        call_id: &str,
    ) -> AgentResult<CallHandle> {
        let url = self.call_url(call_type, call_id, None);
        let body = json!({
            "data": { "created_by_id": self.config.agent_user_id }
        });
        self.post(&url, body).await?;
        Ok(CallHandle::new(call_type, call_id))
    }

    /// Announce the agent as a call participant.
    pub async fn join_call(&self, call: &CallHandle) -> AgentResult<()> {
        let url = self.call_url(&call.call_type, &call.call_id, Some("join"));
        let body = json!({ "create": false });
        self.post(&url, body).await.map(|_| ())
    }

    /// Mark the call ended on the edge.
    pub async fn end_call(&self, call: &CallHandle) -> AgentResult<()> {
        let url = self.call_url(&call.call_type, &call.call_id, Some("mark_ended"));
        self.post(&url, json!({})).await.map(|_| ())
    }

    /// Hosted demo UI address for the human participant.
    pub fn demo_join_url(&self, call_type: &str, call_id: &str) -> String {
        format!(
            "{}/join/{}?type={}&api_key={}",
            self.config.demo_base_url,
            urlencoding::encode(call_id),
            urlencoding::encode(call_type),
            self.config.api_key,
        )
    }

    fn call_url(&self, call_type: &str, call_id: &str, action: Option<&str>) -> String {
        let mut url = format!(
            "{}/api/v2/video/call/{}/{}",
            self.config.base_url,
            urlencoding::encode(call_type),
            urlencoding::encode(call_id),
        );
        if let Some(action) = action {
            url.push('/');
            url.push_str(action);
        }
        url
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> AgentResult<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .header("Authorization", &self.config.api_token)
            .header("stream-auth-type", "jwt")
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

        response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn edge_for(server: &MockServer) -> StreamEdge {
        StreamEdge::new(EdgeConfig {
            api_key: "key123".into(),
            api_token: "token456".into(),
            base_url: server.uri(),
            demo_base_url: "https://demo.example.test".into(),
            agent_user_id: "agent".into(),
            agent_user_name: "Wellness Assistant".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn get_or_create_call_hits_the_call_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/video/call/default/room1"))
            .and(query_param("api_key", "key123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "call": { "cid": "default:room1" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let call = edge_for(&server)
            .get_or_create_call("default", "room1")
            .await
            .unwrap();
        assert_eq!(call, CallHandle::new("default", "room1"));
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = edge_for(&server).upsert_user().await.unwrap_err();
        match err {
            AgentError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "forbidden");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn demo_join_url_embeds_the_identifiers() {
        let server = MockServer::start().await;
        let url = edge_for(&server).demo_join_url("default", "room one");
        assert_eq!(
            url,
            "https://demo.example.test/join/room%20one?type=default&api_key=key123"
        );
    }
}
