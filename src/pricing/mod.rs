pub mod client;
pub mod types;

pub use client::PricingClient;
pub use types::{PricingQuote, PricingRequest};

use crate::errors::PricingFailure;
use std::future::Future;

/// Anything that can turn a pricing request into a quote.
/// The remote service is the only source of truth for prices; implementors
/// must return its numbers as-is and must not touch the session.
/// Send + Sync required for use across tokio tasks.
pub trait PricingService: Send + Sync {
    fn price(
        &self,
        request: &PricingRequest,
    ) -> impl Future<Output = Result<PricingQuote, PricingFailure>> + Send;
}
