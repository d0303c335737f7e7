//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the gateway.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! - `DataBatch` arrives over HTTP and is handed to the ingest coordinator
//! - each `Record` is published through a `MessagePublisher`
//! - the whole batch is written once through a `BulkInserter`
//! - both outcome streams are merged into an `IngestResult`

mod config;
mod error;
mod inserter;
mod outcome;
mod publisher;
mod record;

pub use config::*;
pub use error::*;
pub use inserter::{BulkInserter, LocalBulkInserter, Row};
pub use outcome::*;
pub use publisher::{LocalMessagePublisher, MessagePublisher};
pub use record::{DataBatch, Record};
