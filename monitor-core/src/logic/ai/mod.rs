//! AI Module
//!
//! Generative text flows backed by a hosted language model.
//!
//! ## Structure
//! - `client`: `TextGenerator` trait, `OpenAiClient`, settings and errors
//! - `prompts`: prompt builders for each flow
//! - `parse`: tolerant parsing of generated JSON
//! - `flows`: broadcast copy, sales report, generative status monitor
//! - `crosscheck`: generative status monitor vs. deterministic classifier
//!
//! The classifier does not use this module. Only `monitor::service`
//! reaches in here, for `SubscriptionMonitor::scan_with_cross_check`.

pub mod client;
pub mod prompts;
pub mod parse;
pub mod flows;
pub mod crosscheck;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{AiError, AiSettings, OpenAiClient, TextGenerator};

pub use parse::{parse_generated_flags, GeneratedFlag};

pub use flows::{
    analyze_sales,
    generate_broadcast_message,
    smart_status_monitor,
    BroadcastMessage,
    BroadcastMessageRequest,
    SalesAnalysisRequest,
    SalesReport,
};

pub use crosscheck::{cross_check, CrossCheckReport};
