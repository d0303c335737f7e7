//! BulkInserter trait - warehouse output interface

use crate::InsertErrorDescriptor;

/// Warehouse row (column name -> JSON value)
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Multi-row insert into a warehouse table
#[trait_variant::make(BulkInserter: Send)]
pub trait LocalBulkInserter {
    /// Insert rows into `table_id`
    ///
    /// Never fails the call. Rejected rows come back as
    /// `InsertErrorDescriptor::Row`; a whole-call fault comes back as a single
    /// `InsertErrorDescriptor::Fault`. An empty vector means every row was accepted.
    async fn insert(&self, table_id: &str, rows: &[Row]) -> Vec<InsertErrorDescriptor>;
}
