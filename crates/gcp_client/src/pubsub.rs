//! PubSubPublisher - one REST `topics.publish` call per message

use base64::{prelude::BASE64_STANDARD, Engine};
use contracts::{ContractError, GatewayConfig, MessagePublisher};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::error::{GcpError, Result};
use crate::http::ApiClient;

#[derive(Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Deserialize)]
struct PublishResponse {
    #[serde(default, rename = "messageIds")]
    message_ids: Vec<String>,
}

/// Publisher bound to a single topic
#[derive(Debug, Clone)]
pub struct PubSubPublisher {
    api: ApiClient,
    topic_id: String,
    publish_url: String,
}

impl PubSubPublisher {
    /// Create a publisher for `projects/{project_id}/topics/{topic_id}`
    pub fn new(
        api: ApiClient,
        endpoint: &str,
        project_id: &str,
        topic_id: impl Into<String>,
    ) -> Self {
        let topic_id = topic_id.into();
        let publish_url = format!(
            "{}/v1/projects/{}/topics/{}:publish",
            endpoint.trim_end_matches('/'),
            project_id,
            topic_id
        );
        Self {
            api,
            topic_id,
            publish_url,
        }
    }

    /// Create from gateway configuration
    pub fn from_config(config: &GatewayConfig, api: ApiClient) -> Self {
        Self::new(
            api,
            &config.pubsub.endpoint,
            &config.gcp.project_id,
            config.pubsub.topic_id.clone(),
        )
    }

    pub fn publish_url(&self) -> &str {
        &self.publish_url
    }

    async fn try_publish(&self, payload: &str) -> Result<String> {
        let request = PublishRequest {
            messages: vec![PubsubMessage {
                data: BASE64_STANDARD.encode(payload.as_bytes()),
            }],
        };

        let response: PublishResponse = self
            .api
            .post_json(&self.publish_url, &request, "pubsub publish")
            .await?;

        response
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| GcpError::unexpected("pubsub publish", "no message id returned"))
    }
}

impl MessagePublisher for PubSubPublisher {
    fn topic(&self) -> &str {
        &self.topic_id
    }

    #[instrument(
        name = "pubsub_publish",
        skip(self, payload),
        fields(topic = %self.topic_id, bytes = payload.len())
    )]
    async fn publish(&self, payload: &str) -> std::result::Result<String, ContractError> {
        match self.try_publish(payload).await {
            Ok(message_id) => {
                debug!(message_id = %message_id, "Published");
                Ok(message_id)
            }
            Err(e) => {
                error!(error = %e, "Error publishing to Pub/Sub");
                Err(ContractError::publish(&self.topic_id, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_publish_encodes_payload_and_returns_id() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route(
                "/v1/projects/demo/topics/{topic}",
                post(
                    |State(captured): State<Captured>, Json(body): Json<Value>| async move {
                        captured.lock().unwrap().push(body);
                        Json(json!({"messageIds": ["4242"]}))
                    },
                ),
            )
            .with_state(captured.clone());
        let endpoint = spawn_server(router).await;

        let publisher = PubSubPublisher::new(ApiClient::anonymous(), &endpoint, "demo", "data-topic");
        let id = publisher.publish(r#"{"name":"a","value":1.0}"#).await.unwrap();
        assert_eq!(id, "4242");

        let bodies = captured.lock().unwrap();
        let data = bodies[0]["messages"][0]["data"].as_str().unwrap();
        let decoded = BASE64_STANDARD.decode(data).unwrap();
        assert_eq!(decoded, br#"{"name":"a","value":1.0}"#);
    }

    #[tokio::test]
    async fn test_publish_error_carries_api_message() {
        let router = Router::new().route(
            "/v1/projects/demo/topics/{topic}",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": {"code": 404, "message": "Resource not found (resource=data-topic).", "status": "NOT_FOUND"}})),
                )
            }),
        );
        let endpoint = spawn_server(router).await;

        let publisher = PubSubPublisher::new(ApiClient::anonymous(), &endpoint, "demo", "data-topic");
        let err = publisher.publish("x").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("data-topic"), "{msg}");
        assert!(msg.contains("Resource not found"), "{msg}");
    }

    #[test]
    fn test_publish_url() {
        let publisher = PubSubPublisher::new(
            ApiClient::anonymous(),
            "https://pubsub.googleapis.com/",
            "proj",
            "data-topic",
        );
        assert_eq!(
            publisher.publish_url(),
            "https://pubsub.googleapis.com/v1/projects/proj/topics/data-topic:publish"
        );
    }
}
