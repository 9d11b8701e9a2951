//! # Event Handlers
//!
//! Background consumers of subsystem events.

pub mod payment_events;

pub use payment_events::PaymentEventHandler;
