//! Adapters for the payment gateway port.

pub mod simulated;
