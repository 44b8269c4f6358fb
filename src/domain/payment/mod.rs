//! Payment aggregate, billing cycles, and terminal-state events.

mod billing_cycle;
mod events;
mod payment;

pub use billing_cycle::BillingCycle;
pub use events::PaymentEvent;
pub use payment::{Amount, Payment, PaymentDraft, PaymentStatus};
