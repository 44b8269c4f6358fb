//! Wellpay - Payment gateway integration service
//!
//! This crate owns order initiation against a PhonePe-style payment
//! gateway, webhook verification and dispatch, and the resulting
//! idempotent subscription state transitions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
