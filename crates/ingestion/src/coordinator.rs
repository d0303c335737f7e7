//! IngestCoordinator - one batch in, N publishes + one insert out

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    BulkInserter, DataBatch, GatewayConfig, IngestResult, IngestStatus, InsertErrorDescriptor,
    MessagePublisher, PublishOutcome, Record, Row, StatusPolicy,
};
use futures::stream::{FuturesOrdered, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestError, Result};
use crate::metrics::IngestMetrics;

/// Fans a batch out to the publisher and the inserter and merges the outcomes
///
/// Collaborators are injected once at startup and shared through `Arc`.
pub struct IngestCoordinator<P, I> {
    publisher: Arc<P>,
    inserter: Arc<I>,
    table_id: String,
    publish_concurrency: usize,
    status_policy: StatusPolicy,
    metrics: Arc<IngestMetrics>,
}

impl<P, I> IngestCoordinator<P, I>
where
    P: MessagePublisher + Send + Sync,
    I: BulkInserter + Send + Sync,
{
    /// Sequential publishing, default status policy
    pub fn new(publisher: Arc<P>, inserter: Arc<I>, table_id: impl Into<String>) -> Self {
        Self {
            publisher,
            inserter,
            table_id: table_id.into(),
            publish_concurrency: 1,
            status_policy: StatusPolicy::default(),
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Table id, concurrency and policy from configuration
    pub fn from_config(publisher: Arc<P>, inserter: Arc<I>, config: &GatewayConfig) -> Self {
        Self::new(publisher, inserter, config.bigquery.table_id.clone())
            .with_publish_concurrency(config.pipeline.publish_concurrency)
            .with_status_policy(config.pipeline.status_policy)
    }

    /// Max publishes in flight; completions stay in batch order
    pub fn with_publish_concurrency(mut self, concurrency: usize) -> Self {
        self.publish_concurrency = concurrency.max(1);
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn publish_concurrency(&self) -> usize {
        self.publish_concurrency
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.metrics.clone()
    }

    /// Process one batch
    ///
    /// Every record is published (a failure never stops the loop), then all
    /// records are inserted in one call, then both outcomes are merged.
    #[instrument(
        name = "ingest_process",
        skip(self, batch),
        fields(records = batch.len(), table_id = %self.table_id, topic = %self.publisher.topic())
    )]
    pub async fn process(&self, batch: &DataBatch) -> Result<IngestResult> {
        if batch.is_empty() {
            self.metrics.record_rejected();
            observability::metrics::record_batch_rejected();
            warn!("Rejected empty batch");
            return Err(IngestError::EmptyBatch);
        }

        let started = Instant::now();
        let rows = batch
            .items
            .iter()
            .map(Record::to_row)
            .collect::<std::result::Result<Vec<Row>, _>>()?;

        let publish_outcomes = self.publish_all(&batch.items).await;
        let insert_errors = self.inserter.insert(&self.table_id, &rows).await;

        let result = merge(
            self.status_policy,
            batch.len(),
            publish_outcomes,
            insert_errors,
        );

        let failed_publishes = result.publish_failures();
        if result.is_success() && failed_publishes > 0 {
            warn!(
                failed_publishes,
                "Batch reported success although some publishes failed"
            );
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_result(&result);
        observability::metrics::record_batch(&result, latency_ms);
        info!(
            status = ?result.status,
            failed_publishes,
            insert_errors = result.insert_errors.as_ref().map_or(0, Vec::len),
            latency_ms,
            "Batch processed"
        );

        Ok(result)
    }

    /// Publish every record, at most `publish_concurrency` at a time, outcomes in batch order
    async fn publish_all(&self, records: &[Record]) -> Vec<PublishOutcome> {
        let mut outcomes = Vec::with_capacity(records.len());
        let mut pending = records.iter().enumerate();
        let mut in_flight = FuturesOrdered::new();

        loop {
            while in_flight.len() < self.publish_concurrency {
                match pending.next() {
                    Some((index, record)) => in_flight.push_back(self.publish_one(index, record)),
                    None => break,
                }
            }
            match in_flight.next().await {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }

        outcomes
    }

    #[instrument(name = "ingest_publish_record", skip(self, record), fields(record_index = index))]
    async fn publish_one(&self, index: usize, record: &Record) -> PublishOutcome {
        let payload = match record.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to render record");
                return PublishOutcome::error(e.to_string());
            }
        };

        match self.publisher.publish(&payload).await {
            Ok(message_id) => {
                debug!(message_id = %message_id, "Record published");
                PublishOutcome::success(message_id)
            }
            Err(e) => {
                warn!(error = %e, "Record publish failed");
                PublishOutcome::error(e.to_string())
            }
        }
    }
}

/// Merge publish outcomes and insert errors into the batch result
pub fn merge(
    policy: StatusPolicy,
    processed_count: usize,
    publish_outcomes: Vec<PublishOutcome>,
    insert_errors: Vec<InsertErrorDescriptor>,
) -> IngestResult {
    let insert_clean = insert_errors.is_empty();
    let publish_clean = publish_outcomes.iter().all(PublishOutcome::is_success);

    let success = match policy {
        StatusPolicy::InsertOnly => insert_clean,
        StatusPolicy::AllSinks => insert_clean && publish_clean,
    };

    IngestResult {
        status: if success {
            IngestStatus::Success
        } else {
            IngestStatus::PartialSuccess
        },
        processed_count,
        publish_outcomes,
        insert_errors: (!insert_clean).then_some(insert_errors),
    }
}
