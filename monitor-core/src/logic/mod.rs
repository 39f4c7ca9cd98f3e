//! Logic Module - monitoring rules and AI flows

pub mod monitor;
pub mod ai;
