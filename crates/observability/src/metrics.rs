//! Gateway 指标记录
//!
//! 每个批次处理完成后记录 Prometheus 指标。

use contracts::{IngestResult, IngestStatus};
use metrics::{counter, histogram};

/// 状态标签
fn status_label(status: IngestStatus) -> &'static str {
    match status {
        IngestStatus::Success => "success",
        IngestStatus::PartialSuccess => "partial_success",
    }
}

/// 从 IngestResult 记录指标
///
/// # Example
///
/// ```ignore
/// let result = coordinator.process(&batch).await?;
/// observability::metrics::record_batch(&result, latency_ms);
/// ```
pub fn record_batch(result: &IngestResult, latency_ms: f64) {
    // 批次计数器
    counter!(
        "pipeline_gateway_batches_total",
        "status" => status_label(result.status)
    )
    .increment(1);

    // 记录数
    counter!("pipeline_gateway_records_total").increment(result.processed_count as u64);

    // 发布结果
    let failed = result.publish_failures();
    let succeeded = result.publish_outcomes.len() - failed;
    if succeeded > 0 {
        counter!("pipeline_gateway_publish_total", "status" => "success")
            .increment(succeeded as u64);
    }
    if failed > 0 {
        counter!("pipeline_gateway_publish_total", "status" => "error").increment(failed as u64);
    }

    // 写入错误
    if let Some(errors) = &result.insert_errors {
        counter!("pipeline_gateway_insert_errors_total").increment(errors.len() as u64);
    }

    // 批次延迟
    histogram!("pipeline_gateway_batch_latency_ms").record(latency_ms);
}

/// 记录被拒绝的空批次
pub fn record_batch_rejected() {
    counter!("pipeline_gateway_batches_total", "status" => "rejected").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{InsertErrorDescriptor, PublishOutcome};
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_record_batch_exposed_in_prometheus() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let result = IngestResult {
            status: IngestStatus::PartialSuccess,
            processed_count: 3,
            publish_outcomes: vec![
                PublishOutcome::success("m1"),
                PublishOutcome::error("x"),
                PublishOutcome::success("m3"),
            ],
            insert_errors: Some(vec![InsertErrorDescriptor::fault("timeout")]),
        };
        metrics::with_local_recorder(&recorder, || {
            record_batch(&result, 12.5);
            record_batch_rejected();
        });

        let output = handle.render();
        assert!(output.contains(r#"pipeline_gateway_batches_total{status="partial_success"} 1"#));
        assert!(output.contains(r#"pipeline_gateway_batches_total{status="rejected"} 1"#));
        assert!(output.contains("pipeline_gateway_records_total 3"));
        assert!(output.contains(r#"pipeline_gateway_publish_total{status="success"} 2"#));
        assert!(output.contains(r#"pipeline_gateway_publish_total{status="error"} 1"#));
        assert!(output.contains("pipeline_gateway_insert_errors_total 1"));
        assert!(output.contains("pipeline_gateway_batch_latency_ms"));
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(IngestStatus::Success), "success");
        assert_eq!(status_label(IngestStatus::PartialSuccess), "partial_success");
    }
}
