use crate::error::{CheckoutError, Result};
use clap::Args;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "ZAR";
pub const DEFAULT_QUOTE_DELAY_MS: u64 = 1000;

/// Settings shared by every checkout session in a process.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutConfig {
    /// ISO 4217 code sent with every payment.
    pub currency: String,
    /// Publishable key handed to the payment widget.
    pub public_key: String,
    /// Simulated processing time between requesting a quote and showing it.
    pub quote_delay: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            public_key: String::new(),
            quote_delay: Duration::from_millis(DEFAULT_QUOTE_DELAY_MS),
        }
    }
}

impl CheckoutConfig {
    pub fn validate(self) -> Result<Self> {
        let code = &self.currency;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CheckoutError::Validation(format!(
                "Currency must be a three-letter ISO code, got '{code}'"
            )));
        }
        Ok(self)
    }
}

/// Command-line and environment overrides for [`CheckoutConfig`].
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Payment provider public key
    #[arg(long, env = "CHECKOUT_PUBLIC_KEY", default_value = "")]
    pub public_key: String,

    /// Currency code sent to the payment provider
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    /// Simulated quote processing delay in milliseconds
    #[arg(long, env = "CHECKOUT_QUOTE_DELAY_MS", default_value_t = DEFAULT_QUOTE_DELAY_MS)]
    pub quote_delay_ms: u64,
}

impl TryFrom<ConfigArgs> for CheckoutConfig {
    type Error = CheckoutError;

    fn try_from(args: ConfigArgs) -> Result<Self> {
        CheckoutConfig {
            currency: args.currency,
            public_key: args.public_key,
            quote_delay: Duration::from_millis(args.quote_delay_ms),
        }
        .validate()
    }
}
