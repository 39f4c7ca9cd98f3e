//! SubMan Core - Subscription Monitor
//!
//! Library side of the SubMan admin back-office.
//!
//! ## Structure
//! - `logic::monitor` - deterministic subscription anomaly classifier,
//!   repository seam and the scan service built on top of it
//! - `logic::ai` - generative text flows (broadcast copy, sales reports,
//!   status monitor) and the cross-check against the deterministic classifier
//!
//! The classifier (`monitor::classifier`) never depends on the `ai` module;
//! only the scan service calls into it for cross-checks. The classifier's
//! output is the reference the generative variant is measured against.

pub mod logic;

pub use logic::{ai, monitor};
