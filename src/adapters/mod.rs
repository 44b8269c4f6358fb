//! Adapters: concrete implementations of the ports.

pub mod http;
pub mod memory;
pub mod phonepe;
pub mod postgres;
