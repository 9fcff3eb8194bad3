use crate::domain::ports::{PaymentConfig, PaymentGateway, PaymentOutcome};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How the simulated customer responds to the payment interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimulatedBehaviour {
    /// Pays; the attempt reference is echoed back as the transaction reference.
    Approve,
    /// Closes the payment interface without paying.
    Decline,
    /// The provider errors before producing a result.
    Fail,
    /// Never reports back.
    #[value(skip)]
    Hang,
}

/// An in-process stand-in for the hosted payment widget.
///
/// Records every attempt it is handed so callers can check how often the
/// gateway was invoked and with what.
#[derive(Clone)]
pub struct SimulatedGateway {
    behaviour: SimulatedBehaviour,
    latency: Duration,
    attempts: Arc<RwLock<Vec<PaymentConfig>>>,
}

impl SimulatedGateway {
    pub fn new(behaviour: SimulatedBehaviour) -> Self {
        Self {
            behaviour,
            latency: Duration::ZERO,
            attempts: Arc::default(),
        }
    }

    /// Delays each result by `latency`, as a customer filling in card details would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn attempts(&self) -> Vec<PaymentConfig> {
        self.attempts.read().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn initiate(&self, config: PaymentConfig) -> Result<PaymentOutcome> {
        let reference = config.reference.clone();
        self.attempts.write().await.push(config);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.behaviour {
            SimulatedBehaviour::Approve => Ok(PaymentOutcome::Success { reference }),
            SimulatedBehaviour::Decline => Ok(PaymentOutcome::Cancelled),
            SimulatedBehaviour::Fail => Err(CheckoutError::Gateway(format!(
                "Simulated provider failure for {reference}"
            ))),
            SimulatedBehaviour::Hang => std::future::pending().await,
        }
    }
}
