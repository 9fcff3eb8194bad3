use super::ports::{PaymentConfig, PaymentOutcome, new_reference};
use super::pricing;
use super::quote::{MinorUnits, Quote, QuoteRequest, TimeOfDay, parse_flag};
use super::tier::ServiceTier;
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

pub const MISSING_EMAIL_MESSAGE: &str = "Please enter a valid email address to proceed.";
pub const PAYMENT_SUCCESS_MESSAGE: &str = "Thank you! Your payment was successful.";
pub const PAYMENT_CANCELLED_MESSAGE: &str = "Payment was not completed. Please try again.";

/// Where a checkout session is. Moves strictly forward; terminal states end the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Collecting,
    Ready,
    PaymentPending { reference: String },
    Terminal(PaymentOutcome),
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Ready => "ready",
            Self::PaymentPending { .. } => "payment pending",
            Self::Terminal(_) => "terminal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

/// A single edit to the quote form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Email(String),
    Tier(ServiceTier),
    Start(TimeOfDay),
    End(TimeOfDay),
    DangerousLocation(bool),
    AdverseWeather(bool),
    Emergency(bool),
    SpecialEquipment(bool),
}

impl FormField {
    /// Builds an edit from a form field name and its raw value.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let flag = || -> Result<bool> {
            parse_flag(value).ok_or_else(|| {
                CheckoutError::Validation(format!("Invalid value '{}' for {name}", value.trim()))
            })
        };

        Ok(match name {
            "email" => Self::Email(value.trim().to_string()),
            "tier" | "serviceTier" => Self::Tier(value.parse()?),
            "start" | "startTime" => Self::Start(value.parse()?),
            "end" | "endTime" => Self::End(value.parse()?),
            "dangerous" | "isDangerousLocation" => Self::DangerousLocation(flag()?),
            "weather" | "isAdverseWeather" => Self::AdverseWeather(flag()?),
            "emergency" | "isEmergency" => Self::Emergency(flag()?),
            "special_equipment" | "isSpecialEquipment" => Self::SpecialEquipment(flag()?),
            other => {
                return Err(CheckoutError::Validation(format!("Unknown field '{other}'")));
            }
        })
    }

    fn apply(self, request: &mut QuoteRequest) {
        match self {
            Self::Email(email) => request.email = email,
            Self::Tier(tier) => request.tier = tier,
            Self::Start(time) => request.start = time,
            Self::End(time) => request.end = time,
            Self::DangerousLocation(on) => request.dangerous_location = on,
            Self::AdverseWeather(on) => request.adverse_weather = on,
            Self::Emergency(on) => request.emergency = on,
            Self::SpecialEquipment(on) => request.special_equipment = on,
        }
    }
}

/// User-facing message produced by the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Validation(String),
    PaymentSucceeded(String),
    PaymentCancelled(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::PaymentSucceeded(msg) | Self::PaymentCancelled(msg) => {
                msg
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What the confirmation view shows before payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteSummary {
    pub email: String,
    pub tier: ServiceTier,
    pub total: MinorUnits,
    pub currency: String,
}

impl fmt::Display for QuoteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Email: {}", self.email)?;
        writeln!(f, "Chosen Security Tier: {}", self.tier)?;
        write!(f, "Total Amount: {} {}", self.total, self.currency)
    }
}

/// Point-in-time view of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub request: QuoteRequest,
    pub quote: Option<Quote>,
    pub busy: bool,
    pub notice: Option<Notice>,
}

/// The checkout state machine for one session.
///
/// Owns the form contents and the flow state. Quote computation is split in
/// two (`begin_quote` / `finish_quote`) so the caller can hold the session
/// busy across the processing delay.
#[derive(Debug)]
pub struct CheckoutFlow {
    request: QuoteRequest,
    state: FlowState,
    quote: Option<Quote>,
    busy: bool,
    notice: Option<Notice>,
    currency: String,
    public_key: String,
}

impl CheckoutFlow {
    pub fn new(config: &CheckoutConfig) -> Self {
        Self {
            request: QuoteRequest::default(),
            state: FlowState::Collecting,
            quote: None,
            busy: false,
            notice: None,
            currency: config.currency.clone(),
            public_key: config.public_key.clone(),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn request(&self) -> &QuoteRequest {
        &self.request
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the emergency and special equipment options are on offer.
    pub fn shows_advanced_options(&self) -> bool {
        self.request.tier.offers_flat_fees()
    }

    pub fn update_field(&mut self, field: FormField) -> Result<()> {
        self.ensure_collecting("edit the form")?;
        debug!(?field, "Form field updated");
        field.apply(&mut self.request);
        Ok(())
    }

    /// Validates the form and prices it, leaving the session busy until [`finish_quote`].
    ///
    /// A missing email is surfaced as a notice and leaves the session
    /// untouched; nothing is priced.
    ///
    /// [`finish_quote`]: CheckoutFlow::finish_quote
    pub fn begin_quote(&mut self) -> Result<&Quote> {
        self.ensure_collecting("request a quote")?;

        if !self.request.has_email() {
            warn!("Quote requested without an email address");
            self.notice = Some(Notice::Validation(MISSING_EMAIL_MESSAGE.to_string()));
            return Err(CheckoutError::Validation(MISSING_EMAIL_MESSAGE.to_string()));
        }

        self.notice = None;
        self.busy = true;
        let quote = pricing::price(&self.request);
        info!(tier = %quote.tier, total = quote.total.value(), "Quote computed");
        Ok(&*self.quote.insert(quote))
    }

    /// Completes a quote started by `begin_quote` and moves to `Ready`.
    pub fn finish_quote(&mut self) -> Result<()> {
        if !self.busy || self.state != FlowState::Collecting || self.quote.is_none() {
            return Err(self.invalid("finish a quote"));
        }
        self.busy = false;
        self.state = FlowState::Ready;
        info!("Quote ready for payment");
        Ok(())
    }

    /// Prices the current form and moves to `Ready` without a processing delay.
    pub fn request_quote(&mut self) -> Result<MinorUnits> {
        let total = self.begin_quote()?.total;
        self.finish_quote()?;
        Ok(total)
    }

    pub fn summary(&self) -> Option<QuoteSummary> {
        if self.state == FlowState::Collecting {
            return None;
        }
        self.quote.as_ref().map(|quote| QuoteSummary {
            email: self.request.email.clone(),
            tier: self.request.tier,
            total: quote.total,
            currency: self.currency.clone(),
        })
    }

    /// Starts a payment attempt for the quoted amount and moves to `PaymentPending`.
    ///
    /// The total is recomputed from the form rather than reused.
    pub fn confirm_payment(&mut self) -> Result<PaymentConfig> {
        if self.state != FlowState::Ready {
            return Err(self.invalid("confirm payment"));
        }

        let quote = pricing::price(&self.request);
        let config = PaymentConfig {
            reference: new_reference(),
            email: self.request.email.clone(),
            currency: self.currency.clone(),
            amount: quote.total,
            public_key: self.public_key.clone(),
        };
        self.quote = Some(quote);
        self.state = FlowState::PaymentPending {
            reference: config.reference.clone(),
        };
        info!(reference = %config.reference, amount = config.amount.value(), "Payment initiated");
        Ok(config)
    }

    /// Applies the payment result. Accepted once; the session is terminal afterwards.
    pub fn resolve_payment(&mut self, outcome: PaymentOutcome) -> Result<()> {
        if !matches!(self.state, FlowState::PaymentPending { .. }) {
            return Err(self.invalid("resolve a payment"));
        }

        self.notice = Some(match &outcome {
            PaymentOutcome::Success { reference } => {
                info!(%reference, "Payment successful");
                Notice::PaymentSucceeded(format!("{PAYMENT_SUCCESS_MESSAGE} Reference: {reference}"))
            }
            PaymentOutcome::Cancelled => {
                info!("Payment process was closed");
                Notice::PaymentCancelled(PAYMENT_CANCELLED_MESSAGE.to_string())
            }
        });
        self.state = FlowState::Terminal(outcome);
        Ok(())
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            state: self.state.clone(),
            request: self.request.clone(),
            quote: self.quote.clone(),
            busy: self.busy,
            notice: self.notice.clone(),
        }
    }

    fn ensure_collecting(&self, action: &'static str) -> Result<()> {
        if self.state != FlowState::Collecting {
            return Err(self.invalid(action));
        }
        if self.busy {
            return Err(CheckoutError::Busy);
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            state: self.state.as_str(),
            action,
        }
    }
}
