//! Application layer driving a checkout session.
//!
//! This module defines the `CheckoutController`, which runs a session's state
//! machine on its own task and talks to it over `tokio` channels. The quote
//! delay and the payment gateway call run on helper tasks that report back to
//! the session, so their completion is applied in order with user commands.

pub mod controller;
