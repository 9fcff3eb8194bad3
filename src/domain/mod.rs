//! Domain layer: rates, quote requests, pricing and the checkout state machine.
//!
//! Nothing in here spawns tasks or performs I/O. The payment provider is only
//! known through the [`ports::PaymentGateway`] trait.

pub mod flow;
pub mod ports;
pub mod pricing;
pub mod quote;
pub mod tier;
