//! Domain layer: aggregates, value objects, and domain services.
//! No IO happens here; persistence and transport live in adapters.

pub mod foundation;
pub mod payment;
pub mod signature;
pub mod subscription;
pub mod webhook;
