//! MessagePublisher trait - message bus output interface

use crate::ContractError;

/// Single-message publish to a topic
///
/// Implementations are created once at startup and shared between requests,
/// so every method takes `&self`.
#[trait_variant::make(MessagePublisher: Send)]
pub trait LocalMessagePublisher {
    /// Topic name (used for logging/metrics)
    fn topic(&self) -> &str;

    /// Publish one payload
    ///
    /// Returns the delivery id assigned by the bus.
    ///
    /// # Errors
    /// Any transport or service fault; no retry is attempted.
    async fn publish(&self, payload: &str) -> Result<String, ContractError>;
}
