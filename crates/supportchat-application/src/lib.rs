//! Application layer of the support chat widget.
//!
//! [`WidgetController`] coordinates the conversation store and the webhook
//! transport; [`RequestSlot`] and [`Scheduler`] provide the single in-flight
//! request and the cancellable timers it relies on.

pub mod controller;
pub mod request_slot;
pub mod scheduler;

pub use controller::{RejectReason, SendOutcome, WidgetController, WidgetStatus};
pub use request_slot::{RequestPermit, RequestSlot};
pub use scheduler::Scheduler;
