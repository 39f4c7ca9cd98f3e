//! Monitor Rules & Thresholds
//!
//! Policy thresholds for the subscription classifier.
//! No classification logic here - only constants and config.

use chrono::Duration;
use serde::{Deserialize, Serialize};

// ============================================================================
// THRESHOLDS
// ============================================================================

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Default lookahead for the imminent expiry rule (7 days)
pub const DEFAULT_LOOKAHEAD_SECS: i64 = 7 * SECS_PER_DAY;

/// Upper bound accepted for the lookahead window (10 years)
pub const MAX_LOOKAHEAD_SECS: i64 = 3650 * SECS_PER_DAY;

/// Stale active subscriptions are not flagged unless asked for
pub const DEFAULT_FLAG_STALE_ACTIVE: bool = false;

// ============================================================================
// CONFIGURABLE THRESHOLDS
// ============================================================================

/// Thresholds for classification (configurable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorThresholds {
    /// Active subscriptions ending within `[now, now + lookahead)` are flagged
    pub lookahead_secs: i64,
    /// Flag active subscriptions whose end date is already in the past
    pub flag_stale_active: bool,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            flag_stale_active: DEFAULT_FLAG_STALE_ACTIVE,
        }
    }
}

impl MonitorThresholds {
    pub fn from_days(days: u32) -> Self {
        Self {
            lookahead_secs: i64::from(days) * SECS_PER_DAY,
            ..Default::default()
        }
    }

    /// Two-week window and stale active detection
    pub fn high_sensitivity() -> Self {
        Self {
            lookahead_secs: 14 * SECS_PER_DAY,
            flag_stale_active: true,
        }
    }

    /// Three-day window, stale records ignored
    pub fn low_sensitivity() -> Self {
        Self {
            lookahead_secs: 3 * SECS_PER_DAY,
            flag_stale_active: false,
        }
    }

    pub fn with_stale_active(mut self, enabled: bool) -> Self {
        self.flag_stale_active = enabled;
        self
    }

    /// Lookahead window, clamped to `[0, MAX_LOOKAHEAD_SECS]`
    pub fn lookahead(&self) -> Duration {
        Duration::seconds(self.lookahead_secs.clamp(0, MAX_LOOKAHEAD_SECS))
    }
}
