use super::quote::MinorUnits;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything the hosted payment widget needs to collect one payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentConfig {
    /// Unique per payment attempt.
    pub reference: String,
    pub email: String,
    pub currency: String,
    pub amount: MinorUnits,
    pub public_key: String,
}

/// How a payment attempt ended. The gateway reports exactly one per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success { reference: String },
    Cancelled,
}

/// The external payment collaborator.
///
/// Presents the payment interface and resolves once the customer pays or
/// closes it. An `Err` means the attempt failed without a result and is
/// treated by the checkout as a cancellation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate(&self, config: PaymentConfig) -> Result<PaymentOutcome>;
}

pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

static REFERENCE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A timestamp-derived attempt reference, e.g. `1760900000000-0`.
///
/// The sequence suffix keeps references unique when two attempts land in the same millisecond.
pub fn new_reference() -> String {
    let seq = REFERENCE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", Utc::now().timestamp_millis(), seq)
}
