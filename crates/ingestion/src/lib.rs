//! # Ingestion
//!
//! Batch ingest coordinator.
//!
//! Responsibilities:
//! - Reject empty batches before any downstream call
//! - Publish every record (sequential or bounded-concurrent, batch order kept)
//! - Insert the whole batch in one call
//! - Merge both outcomes into an `IngestResult`
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ingestion::IngestCoordinator;
//!
//! let clients = gcp_client::GcpClients::from_config(&config)?;
//! let coordinator = IngestCoordinator::from_config(
//!     Arc::new(clients.publisher),
//!     Arc::new(clients.inserter),
//!     &config,
//! );
//! let result = coordinator.process(&batch).await?;
//! ```

mod coordinator;
mod error;
mod metrics;

// Re-exports
pub use coordinator::{merge, IngestCoordinator};
pub use error::{IngestError, Result};
pub use metrics::{IngestMetrics, MetricsSnapshot};
