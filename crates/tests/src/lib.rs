//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（HTTP 响应结构）
//! - 模拟 e2e 测试：Router -> Coordinator -> Mock 发布器/写入器
//! - 本地假 GCP 服务 e2e：配置 -> 真实 REST 客户端 -> 假 Pub/Sub + BigQuery

#[cfg(test)]
mod support {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::response::Response;
    use serde_json::Value;

    pub fn post_batch(body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/pipeline/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn read_json(resp: Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}

#[cfg(test)]
mod mock_e2e_tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::Router;
    use contracts::InsertErrorDescriptor;
    use gcp_client::{MockInserter, MockPublisher};
    use http_api::GatewayServer;
    use ingestion::IngestCoordinator;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::support::{post_batch, read_json};

    fn gateway(
        publisher: MockPublisher,
        inserter: MockInserter,
    ) -> (Router, Arc<MockPublisher>, Arc<MockInserter>) {
        let publisher = Arc::new(publisher);
        let inserter = Arc::new(inserter);
        let coordinator =
            IngestCoordinator::new(publisher.clone(), inserter.clone(), "my_table");
        let router = GatewayServer::new(Arc::new(coordinator), "demo").into_router();
        (router, publisher, inserter)
    }

    /// 两条记录，全部成功
    #[tokio::test]
    async fn test_two_records_all_clean() {
        let (router, _, _) = gateway(MockPublisher::new("data-topic"), MockInserter::new());

        let resp = router
            .oneshot(post_batch(&json!({
                "items": [{"name": "a", "value": 1.0}, {"name": "b", "value": 2.0}]
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            read_json(resp).await,
            json!({
                "status": "success",
                "processed_count": 2,
                "pubsub_results": [
                    {"status": "success", "message_id": "m1"},
                    {"status": "success", "message_id": "m2"}
                ],
                "bigquery_errors": null
            })
        );
    }

    /// 第二条发布失败：结果顺序保持，写入仍包含全部 3 行
    #[tokio::test]
    async fn test_middle_publish_failure() {
        let (router, publisher, inserter) = gateway(
            MockPublisher::failing_on("data-topic", r#""name":"y""#),
            MockInserter::new(),
        );

        let resp = router
            .oneshot(post_batch(&json!({
                "items": [
                    {"name": "x", "value": 1.0},
                    {"name": "y", "value": 2.0},
                    {"name": "z", "value": 3.0}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        let statuses: Vec<_> = body["pubsub_results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["status"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(statuses, vec!["success", "error", "success"]);
        assert_eq!(body["status"], "success");
        assert_eq!(body["processed_count"], 3);

        assert_eq!(publisher.call_count(), 3);
        let calls = inserter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].rows.len(), 3);
        assert_eq!(calls[0].rows[1]["name"], "y");
    }

    /// 写入整体失败 -> partial_success + 合成错误描述
    #[tokio::test]
    async fn test_insert_fault_surfaces_as_data() {
        let (router, _, _) = gateway(
            MockPublisher::new("data-topic"),
            MockInserter::failing("timeout"),
        );

        let resp = router
            .oneshot(post_batch(&json!({"items": [{"name": "a", "value": 1.0}]})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["status"], "partial_success");
        assert_eq!(body["bigquery_errors"], json!([{"error": "timeout"}]));
    }

    /// 行级错误原样透传
    #[tokio::test]
    async fn test_row_errors_passed_through() {
        let descriptor: InsertErrorDescriptor = serde_json::from_value(json!({
            "index": 0,
            "errors": [{"reason": "invalid", "location": "value", "message": "bad"}]
        }))
        .unwrap();
        let (router, _, _) = gateway(
            MockPublisher::new("data-topic"),
            MockInserter::with_errors(vec![descriptor]),
        );

        let resp = router
            .oneshot(post_batch(&json!({"items": [{"name": "a", "value": 1.0}]})))
            .await
            .unwrap();

        let body = read_json(resp).await;
        assert_eq!(body["status"], "partial_success");
        assert_eq!(body["bigquery_errors"][0]["index"], 0);
        assert_eq!(body["bigquery_errors"][0]["errors"][0]["reason"], "invalid");
    }

    /// 空批次 -> 400，且不调用任何下游
    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (router, publisher, inserter) =
            gateway(MockPublisher::new("data-topic"), MockInserter::new());

        let resp = router
            .oneshot(post_batch(&json!({"items": []})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(resp).await,
            json!({"detail": "No data items provided"})
        );
        assert_eq!(publisher.call_count(), 0);
        assert_eq!(inserter.call_count(), 0);
    }

    /// 任意批次大小下结果数量与批次一致
    #[tokio::test]
    async fn test_outcome_count_matches_batch_len() {
        for len in [1usize, 7, 32] {
            let (router, _, _) = gateway(
                MockPublisher::failing_on("data-topic", "odd"),
                MockInserter::new(),
            );
            let items: Vec<_> = (0..len)
                .map(|i| {
                    let name = if i % 2 == 1 { format!("odd{i}") } else { format!("even{i}") };
                    json!({"name": name, "value": i as f64})
                })
                .collect();

            let resp = router
                .oneshot(post_batch(&json!({ "items": items })))
                .await
                .unwrap();
            let body = read_json(resp).await;

            assert_eq!(body["processed_count"], len);
            assert_eq!(body["pubsub_results"].as_array().unwrap().len(), len);
        }
    }
}

#[cfg(test)]
mod fake_gcp_e2e_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use base64::{prelude::BASE64_STANDARD, Engine};
    use config_loader::{ConfigFormat, ConfigLoader};
    use gcp_client::GcpClients;
    use http_api::GatewayServer;
    use ingestion::IngestCoordinator;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::support::{post_batch, read_json};

    #[derive(Clone, Default)]
    struct FakeGcp {
        published: Arc<Mutex<Vec<Value>>>,
        inserted: Arc<Mutex<Vec<(String, Value)>>>,
        reject_first_row: bool,
    }

    async fn publish(
        State(fake): State<FakeGcp>,
        Path((_project, _topic)): Path<(String, String)>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let data = body["messages"][0]["data"].as_str().unwrap_or_default();
        let decoded: Value = serde_json::from_slice(&BASE64_STANDARD.decode(data).unwrap()).unwrap();
        let mut published = fake.published.lock().unwrap();
        published.push(decoded);
        Json(json!({"messageIds": [format!("srv-{}", published.len())]}))
    }

    async fn insert_all(
        State(fake): State<FakeGcp>,
        Path((_project, _dataset, table)): Path<(String, String, String)>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        fake.inserted.lock().unwrap().push((table, body));
        if fake.reject_first_row {
            (
                StatusCode::OK,
                Json(json!({"insertErrors": [{"index": 0, "errors": [{"reason": "invalid", "message": "no"}]}]})),
            )
        } else {
            (StatusCode::OK, Json(json!({"kind": "bigquery#tableDataInsertAllResponse"})))
        }
    }

    async fn spawn_fake_gcp(fake: FakeGcp) -> String {
        let router = Router::new()
            .route("/v1/projects/{project}/topics/{topic}", post(publish))
            .route(
                "/bigquery/v2/projects/{project}/datasets/{dataset}/tables/{table}/insertAll",
                post(insert_all),
            )
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway_for(endpoint: &str) -> Router {
        let toml = format!(
            r#"
[gcp]
project_id = "demo"
dataset_id = "analytics"

[pubsub]
endpoint = "{endpoint}"

[bigquery]
table_id = "events"
endpoint = "{endpoint}"

[pipeline]
publish_concurrency = 4
"#
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let clients = GcpClients::from_config(&config).unwrap();
        let coordinator = IngestCoordinator::from_config(
            Arc::new(clients.publisher),
            Arc::new(clients.inserter),
            &config,
        );
        GatewayServer::new(Arc::new(coordinator), &config.gcp.project_id).into_router()
    }

    /// 完整链路：HTTP -> 协调器 -> REST 客户端 -> 假 GCP
    #[tokio::test]
    async fn test_batch_reaches_both_services() {
        let fake = FakeGcp::default();
        let endpoint = spawn_fake_gcp(fake.clone()).await;
        let router = gateway_for(&endpoint);

        let resp = router
            .oneshot(post_batch(&json!({
                "items": [
                    {"name": "a", "value": 1.0},
                    {"name": "b", "value": 2.5},
                    {"name": "c", "value": -3.0}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["bigquery_errors"], Value::Null);
        let results = body["pubsub_results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r["status"] == "success"));

        let mut published = fake.published.lock().unwrap().clone();
        published.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
        assert_eq!(
            published,
            vec![
                json!({"name": "a", "value": 1.0}),
                json!({"name": "b", "value": 2.5}),
                json!({"name": "c", "value": -3.0})
            ]
        );

        let inserted = fake.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].0, "events");
        assert_eq!(inserted[0].1["rows"][1]["json"], json!({"name": "b", "value": 2.5}));
    }

    /// 行级拒绝 -> partial_success
    #[tokio::test]
    async fn test_row_rejection_from_warehouse() {
        let fake = FakeGcp {
            reject_first_row: true,
            ..Default::default()
        };
        let endpoint = spawn_fake_gcp(fake).await;
        let router = gateway_for(&endpoint);

        let resp = router
            .oneshot(post_batch(&json!({"items": [{"name": "a", "value": 1.0}]})))
            .await
            .unwrap();

        let body = read_json(resp).await;
        assert_eq!(body["status"], "partial_success");
        assert_eq!(body["bigquery_errors"][0]["index"], 0);
    }

    /// 服务不可达：发布逐条失败、写入变为合成错误，请求本身仍为 200
    #[tokio::test]
    async fn test_unreachable_services() {
        let router = gateway_for("http://127.0.0.1:1");

        let resp = router
            .oneshot(post_batch(&json!({
                "items": [{"name": "a", "value": 1.0}, {"name": "b", "value": 2.0}]
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["status"], "partial_success");
        assert!(body["pubsub_results"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["status"] == "error"));
        let errors = body["bigquery_errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0]["error"].is_string());
    }
}
