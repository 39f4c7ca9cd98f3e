//! Subscription Classifier
//!
//! Only classification logic - no types, no I/O.
//! Input: batch of SubscriptionRecord + reference instant
//! Output: Vec<Flag>, at most one per record, in input order

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::error::MonitorError;
use super::rules::MonitorThresholds;
use super::types::{Flag, FlagKind, SubscriptionRecord, SubscriptionStatus};

// ============================================================================
// MAIN CLASSIFICATION FUNCTIONS
// ============================================================================

/// Classify against the wall clock with default thresholds
pub fn classify(batch: &[SubscriptionRecord]) -> Vec<Flag> {
    classify_at(batch, Utc::now())
}

/// Classify against an injected reference instant
pub fn classify_at(batch: &[SubscriptionRecord], now: DateTime<Utc>) -> Vec<Flag> {
    classify_with_thresholds(batch, now, &MonitorThresholds::default())
}

/// Classification with custom thresholds.
///
/// Deterministic: the same batch, `now` and thresholds always produce the
/// same flags in the same order. Duplicate ids are not merged.
pub fn classify_with_thresholds(
    batch: &[SubscriptionRecord],
    now: DateTime<Utc>,
    thresholds: &MonitorThresholds,
) -> Vec<Flag> {
    let flags: Vec<Flag> = batch
        .iter()
        .filter_map(|record| evaluate(record, now, thresholds))
        .collect();

    log::debug!(
        "Classified {} subscriptions at {}: {} flagged",
        batch.len(),
        now,
        flags.len()
    );

    flags
}

/// Run the rules for a single record. First matching rule wins.
pub fn evaluate(
    record: &SubscriptionRecord,
    now: DateTime<Utc>,
    thresholds: &MonitorThresholds,
) -> Option<Flag> {
    // Rule 1: ended but still renewing. Dates are irrelevant here.
    if record.status.is_terminal() && record.auto_renew {
        return Some(Flag::new(
            &record.id,
            FlagKind::InconsistentTerminalState,
            format!(
                "Subscription is {} but auto-renew is still enabled",
                record.status
            ),
        ));
    }

    if record.status != SubscriptionStatus::Active {
        return None;
    }

    let Some(end) = record.end_at() else {
        log::debug!(
            "Subscription {} has unparsable end date {:?}, skipping date rules",
            record.id,
            record.end_date
        );
        return None;
    };

    if end >= now {
        // Rule 2: window is [now, now + lookahead)
        let remaining = end - now;
        if remaining < thresholds.lookahead() {
            return Some(Flag::new(
                &record.id,
                FlagKind::ImminentExpiry,
                format!(
                    "Active subscription expires in {} (on {})",
                    format_span(remaining),
                    record.end_date
                ),
            ));
        }
        return None;
    }

    // Rule 3 (opt-in): still active after the end date
    if thresholds.flag_stale_active {
        return Some(Flag::new(
            &record.id,
            FlagKind::StaleActive,
            format!(
                "Subscription is still active {} after its end date ({})",
                format_span(now - end),
                record.end_date
            ),
        ));
    }

    None
}

// ============================================================================
// UNTYPED INPUT
// ============================================================================

/// Classify a batch supplied as JSON.
///
/// `null` or a non-array value is a caller error. Elements that cannot be
/// decoded are skipped with a warning; the rest of the batch is classified.
pub fn classify_json(
    value: &serde_json::Value,
    now: DateTime<Utc>,
    thresholds: &MonitorThresholds,
) -> Result<Vec<Flag>, MonitorError> {
    let records = decode_batch(value)?;
    Ok(classify_with_thresholds(&records, now, thresholds))
}

/// Decode a JSON array into records, isolating per-element failures
pub fn decode_batch(value: &serde_json::Value) -> Result<Vec<SubscriptionRecord>, MonitorError> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => {
            return Err(MonitorError::InvalidArgument(
                "subscription batch must not be null".to_string(),
            ))
        }
        other => {
            return Err(MonitorError::InvalidArgument(format!(
                "subscription batch must be an array, got {}",
                json_kind(other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match SubscriptionRecord::deserialize(item) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping subscription at index {}: {}", index, e),
        }
    }

    Ok(records)
}

// ============================================================================
// HELPERS
// ============================================================================

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// "3d 4h 5m" style rendering of a non-negative span
fn format_span(span: Duration) -> String {
    let days = span.num_days();
    let hours = span.num_hours() - days * 24;
    let minutes = span.num_minutes() - span.num_hours() * 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn active_ending(id: &str, end: DateTime<Utc>) -> SubscriptionRecord {
        SubscriptionRecord::new(id, SubscriptionStatus::Active)
            .starting(now() - Duration::days(30))
            .ending(end)
    }

    #[test]
    fn test_empty_batch_yields_no_flags() {
        assert!(classify_at(&[], now()).is_empty());
    }

    #[test]
    fn test_scenario_a_active_expiring_in_three_days() {
        let batch = vec![active_ending("s1", now() + Duration::days(3)).with_auto_renew(true)];
        let flags = classify_at(&batch, now());

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].subscription_id, "s1");
        assert_eq!(flags[0].kind, FlagKind::ImminentExpiry);
        assert!(flags[0].reason.contains("3d 0h 0m"));
    }

    #[test]
    fn test_scenario_b_cancelled_with_auto_renew() {
        let batch = vec![SubscriptionRecord::new("s2", SubscriptionStatus::Cancelled)
            .ending(now() + Duration::days(3))
            .with_auto_renew(true)];
        let flags = classify_at(&batch, now());

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].subscription_id, "s2");
        assert_eq!(flags[0].kind, FlagKind::InconsistentTerminalState);
    }

    #[test]
    fn test_scenario_c_expired_without_auto_renew() {
        let batch = vec![SubscriptionRecord::new("s3", SubscriptionStatus::Expired)
            .ending(now() - Duration::days(1))];
        assert!(classify_at(&batch, now()).is_empty());
    }

    #[test]
    fn test_scenario_d_active_far_from_expiry() {
        let batch = vec![active_ending("s4", now() + Duration::days(30))];
        assert!(classify_at(&batch, now()).is_empty());
    }

    #[test]
    fn test_window_upper_bound_is_exclusive() {
        let at_bound = active_ending("edge", now() + Duration::days(7));
        let inside = active_ending("inside", now() + Duration::days(7) - Duration::seconds(1));

        let flags = classify_at(&[at_bound, inside], now());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].subscription_id, "inside");
    }

    #[test]
    fn test_window_lower_bound_is_inclusive() {
        let flags = classify_at(&[active_ending("now", now())], now());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, FlagKind::ImminentExpiry);
    }

    #[test]
    fn test_stale_active_passes_through_by_default() {
        let stale = active_ending("stale", now() - Duration::seconds(1));
        assert!(classify_at(&[stale.clone()], now()).is_empty());

        let thresholds = MonitorThresholds::default().with_stale_active(true);
        let flags = classify_with_thresholds(&[stale], now(), &thresholds);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, FlagKind::StaleActive);
    }

    #[test]
    fn test_terminal_rule_ignores_unparsable_dates() {
        let mut record = SubscriptionRecord::new("bad", SubscriptionStatus::Expired).with_auto_renew(true);
        record.end_date = "not a date".to_string();

        let flags = classify_at(&[record], now());
        assert_eq!(flags[0].kind, FlagKind::InconsistentTerminalState);
    }

    #[test]
    fn test_unparsable_end_date_is_never_imminent() {
        let mut record = SubscriptionRecord::new("bad", SubscriptionStatus::Active);
        record.end_date = "2024-13-45".to_string();

        let thresholds = MonitorThresholds::high_sensitivity();
        assert!(classify_with_thresholds(&[record], now(), &thresholds).is_empty());
    }

    #[test]
    fn test_custom_lookahead() {
        let record = active_ending("s", now() + Duration::days(10));
        assert!(classify_at(&[record.clone()], now()).is_empty());

        let flags = classify_with_thresholds(&[record], now(), &MonitorThresholds::from_days(14));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn test_classify_json_rejects_null_and_non_arrays() {
        let thresholds = MonitorThresholds::default();
        assert!(matches!(
            classify_json(&serde_json::Value::Null, now(), &thresholds),
            Err(MonitorError::InvalidArgument(_))
        ));
        assert!(matches!(
            classify_json(&serde_json::json!({"id": "s1"}), now(), &thresholds),
            Err(MonitorError::InvalidArgument(_))
        ));
        assert_eq!(classify_json(&serde_json::json!([]), now(), &thresholds), Ok(vec![]));
    }

    #[test]
    fn test_classify_json_skips_undecodable_records() {
        let batch = serde_json::json!([
            { "status": "active", "endDate": "2024-01-02T00:00:00Z" },
            { "id": "s9", "status": "paused" },
            { "id": "s1", "status": "active", "endDate": "2024-01-02T00:00:00Z" },
            42,
            { "id": null, "status": "cancelled", "autoRenew": true },
            { "id": "  ", "status": "expired", "autoRenew": true },
            { "status": "cancelled", "autoRenew": true }
        ]);

        let flags = classify_json(&batch, now(), &MonitorThresholds::default()).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].subscription_id, "s1");
    }

    #[test]
    fn test_terminal_rule_wins_over_date_rules() {
        let thresholds = MonitorThresholds::default().with_stale_active(true);
        let batch = vec![
            SubscriptionRecord::new("soon", SubscriptionStatus::Expired)
                .ending(now() + Duration::days(1))
                .with_auto_renew(true),
            SubscriptionRecord::new("past", SubscriptionStatus::Cancelled)
                .ending(now() - Duration::days(1))
                .with_auto_renew(true),
        ];

        let flags = classify_with_thresholds(&batch, now(), &thresholds);
        assert_eq!(flags.len(), 2);
        assert!(flags.iter().all(|f| f.kind == FlagKind::InconsistentTerminalState));
    }

    #[test]
    fn test_format_span() {
        let span = Duration::days(2) + Duration::hours(5) + Duration::minutes(7);
        assert_eq!(format_span(span), "2d 5h 7m");
    }
}
