//! Mock 发布器 / 写入器
//!
//! 用于单元测试和集成测试的 mock 实现，支持注入失败和延迟。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{BulkInserter, ContractError, InsertErrorDescriptor, MessagePublisher, Row};
use tracing::instrument;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock 发布器配置
#[derive(Debug, Default, Clone)]
pub struct MockPublisherConfig {
    /// payload 包含其中任一子串时发布失败
    pub fail_when_contains: Vec<String>,
    /// payload 包含子串时先等待对应时长
    pub delays: Vec<(String, Duration)>,
}

/// 一次发布调用的记录
#[derive(Debug, Clone, PartialEq)]
pub struct PublishCall {
    pub payload: String,
    /// 失败的调用为 `None`
    pub message_id: Option<String>,
}

/// Mock Pub/Sub 发布器
pub struct MockPublisher {
    topic: String,
    config: MockPublisherConfig,
    /// 调用计数器，message id 为 `m{序号}`
    next_call: AtomicUsize,
    /// 按调用开始顺序记录
    calls: Mutex<Vec<PublishCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockPublisher {
    /// 创建总是成功的发布器
    pub fn new(topic: impl Into<String>) -> Self {
        Self::with_config(topic, MockPublisherConfig::default())
    }

    /// 使用配置创建发布器
    pub fn with_config(topic: impl Into<String>, config: MockPublisherConfig) -> Self {
        Self {
            topic: topic.into(),
            config,
            next_call: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// payload 包含 `needle` 时失败
    pub fn failing_on(topic: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::with_config(
            topic,
            MockPublisherConfig {
                fail_when_contains: vec![needle.into()],
                ..Default::default()
            },
        )
    }

    /// 所有调用记录
    pub fn calls(&self) -> Vec<PublishCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// 同时在途的最大调用数
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn should_fail(&self, payload: &str) -> bool {
        self.config
            .fail_when_contains
            .iter()
            .any(|needle| payload.contains(needle.as_str()))
    }

    fn delay_for(&self, payload: &str) -> Option<Duration> {
        self.config
            .delays
            .iter()
            .find(|(needle, _)| payload.contains(needle.as_str()))
            .map(|(_, delay)| *delay)
    }
}

impl MessagePublisher for MockPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    #[instrument(name = "mock_publish", skip(self, payload), fields(topic = %self.topic))]
    async fn publish(&self, payload: &str) -> Result<String, ContractError> {
        let call_index = self.next_call.fetch_add(1, Ordering::SeqCst);
        let fail = self.should_fail(payload);
        let message_id = (!fail).then(|| format!("m{}", call_index + 1));
        lock(&self.calls).push(PublishCall {
            payload: payload.to_string(),
            message_id: message_id.clone(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay_for(payload) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        message_id.ok_or_else(|| ContractError::publish(&self.topic, "mock failure"))
    }
}

/// 一次写入调用的记录
#[derive(Debug, Clone, PartialEq)]
pub struct InsertCall {
    pub table_id: String,
    pub rows: Vec<Row>,
}

/// Mock BigQuery 写入器
#[derive(Default)]
pub struct MockInserter {
    /// 每次调用返回的错误
    errors: Vec<InsertErrorDescriptor>,
    calls: Mutex<Vec<InsertCall>>,
}

impl MockInserter {
    /// 接受所有行
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回指定的行级错误
    pub fn with_errors(errors: Vec<InsertErrorDescriptor>) -> Self {
        Self {
            errors,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 模拟整次调用失败
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_errors(vec![InsertErrorDescriptor::fault(message)])
    }

    pub fn calls(&self) -> Vec<InsertCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl BulkInserter for MockInserter {
    #[instrument(name = "mock_insert", skip(self, rows), fields(table = %table_id, rows = rows.len()))]
    async fn insert(&self, table_id: &str, rows: &[Row]) -> Vec<InsertErrorDescriptor> {
        lock(&self.calls).push(InsertCall {
            table_id: table_id.to_string(),
            rows: rows.to_vec(),
        });
        self.errors.clone()
    }
}
