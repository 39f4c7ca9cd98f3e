//! Monitor Module
//!
//! Flags subscriptions that need attention: ended-but-renewing records,
//! active subscriptions about to expire and, optionally, active records whose
//! end date has already passed.
//!
//! ## Structure
//! - `types`: SubscriptionRecord, SubscriptionStatus, Flag, FlagKind
//! - `rules`: thresholds and presets
//! - `classifier`: the rule pass (pure, deterministic)
//! - `repository`: storage seam + in-memory implementation
//! - `service`: repository scan producing a MonitorReport
//!
//! ## Usage
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use subman_core::monitor::{classify_at, FlagKind, SubscriptionRecord, SubscriptionStatus};
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let batch = vec![
//!     SubscriptionRecord::new("s1", SubscriptionStatus::Active).ending(now + Duration::days(3)),
//! ];
//!
//! let flags = classify_at(&batch, now);
//! assert_eq!(flags[0].kind, FlagKind::ImminentExpiry);
//! ```

pub mod types;
pub mod error;
pub mod rules;
pub mod classifier;
pub mod repository;
pub mod service;

#[cfg(test)]
mod tests;

pub use types::{
    parse_timestamp,
    format_timestamp,
    Flag,
    FlagKind,
    SubscriptionRecord,
    SubscriptionStatus,
};

pub use error::{MonitorError, ParseStatusError, RepositoryError};

pub use rules::{MonitorThresholds, DEFAULT_LOOKAHEAD_SECS, MAX_LOOKAHEAD_SECS};

pub use classifier::{
    classify,
    classify_at,
    classify_with_thresholds,
    classify_json,
    decode_batch,
    evaluate,
};

pub use repository::{InMemorySubscriptionRepository, SubscriptionRepository};

pub use service::{MonitorReport, SubscriptionMonitor};
