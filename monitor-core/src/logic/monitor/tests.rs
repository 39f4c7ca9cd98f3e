//! Integration tests for the subscription monitor
//!
//! Sweeps status, auto-renew and end-date combinations through the classifier.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::*;

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// End-date offsets around every interesting boundary
fn end_offsets() -> Vec<Duration> {
    vec![
        -Duration::days(365),
        -Duration::days(1),
        -Duration::seconds(1),
        Duration::zero(),
        Duration::seconds(1),
        Duration::days(3),
        Duration::days(7) - Duration::seconds(1),
        Duration::days(7),
        Duration::days(7) + Duration::seconds(1),
        Duration::days(30),
    ]
}

fn sweep() -> Vec<SubscriptionRecord> {
    let now = reference_now();
    let mut batch = Vec::new();

    for status in SubscriptionStatus::ALL {
        for auto_renew in [false, true] {
            for (i, offset) in end_offsets().into_iter().enumerate() {
                batch.push(
                    SubscriptionRecord::new(format!("{}-{}-{}", status, auto_renew, i), status)
                        .owned_by("u1", "p1")
                        .starting(now - Duration::days(60))
                        .ending(now + offset)
                        .with_auto_renew(auto_renew),
                );
            }
            // Record whose dates cannot be read at all
            let mut broken = SubscriptionRecord::new(format!("{}-{}-broken", status, auto_renew), status)
                .with_auto_renew(auto_renew);
            broken.start_date = "yesterday".to_string();
            broken.end_date = "31/02/2024".to_string();
            batch.push(broken);
        }
    }

    batch
}

#[test]
fn test_pending_and_inactive_are_never_flagged() {
    let _ = env_logger::builder().is_test(true).try_init();
    let batch = sweep();

    for thresholds in [MonitorThresholds::default(), MonitorThresholds::high_sensitivity()] {
        let flags = classify_with_thresholds(&batch, reference_now(), &thresholds);
        assert!(flags.iter().all(|f| {
            !f.subscription_id.starts_with("pending") && !f.subscription_id.starts_with("inactive")
        }));
    }
}

#[test]
fn test_terminal_with_auto_renew_flagged_exactly_once() {
    let batch = sweep();
    let flags = classify_at(&batch, reference_now());

    for record in batch.iter().filter(|r| r.status.is_terminal() && r.auto_renew) {
        let matching: Vec<&Flag> = flags.iter().filter(|f| f.subscription_id == record.id).collect();
        assert_eq!(matching.len(), 1, "record {}", record.id);
        assert_eq!(matching[0].kind, FlagKind::InconsistentTerminalState);
    }

    for record in batch.iter().filter(|r| r.status.is_terminal() && !r.auto_renew) {
        assert!(flags.iter().all(|f| f.subscription_id != record.id), "record {}", record.id);
    }
}

#[test]
fn test_active_in_window_flagged_as_imminent() {
    let now = reference_now();
    let batch = sweep();
    let flags = classify_at(&batch, now);

    for record in batch.iter().filter(|r| r.status == SubscriptionStatus::Active) {
        let in_window = record
            .end_at()
            .map(|end| end >= now && end < now + Duration::days(7))
            .unwrap_or(false);
        let matching: Vec<&Flag> = flags.iter().filter(|f| f.subscription_id == record.id).collect();

        if in_window {
            assert_eq!(matching.len(), 1, "record {}", record.id);
            assert_eq!(matching[0].kind, FlagKind::ImminentExpiry);
        } else {
            assert!(matching.is_empty(), "record {}", record.id);
        }
    }
}

#[test]
fn test_classification_is_idempotent() {
    let batch = sweep();
    let thresholds = MonitorThresholds::high_sensitivity();

    let first = classify_with_thresholds(&batch, reference_now(), &thresholds);
    let second = classify_with_thresholds(&batch, reference_now(), &thresholds);
    assert_eq!(first, second);
}

#[test]
fn test_output_follows_input_order() {
    let batch = sweep();
    let flags = classify_with_thresholds(&batch, reference_now(), &MonitorThresholds::high_sensitivity());

    let positions: Vec<usize> = flags
        .iter()
        .map(|f| batch.iter().position(|r| r.id == f.subscription_id).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_duplicate_ids_are_not_merged() {
    let now = reference_now();
    let record = SubscriptionRecord::new("dup", SubscriptionStatus::Cancelled).with_auto_renew(true);

    let flags = classify_at(&[record.clone(), record], now);
    assert_eq!(flags.len(), 2);
}

#[test]
fn test_boundary_scenario_from_fixed_reference() {
    let batch = serde_json::json!([
        { "id": "exact", "status": "active", "autoRenew": false, "endDate": "2024-01-08T00:00:00Z" },
        { "id": "just-inside", "status": "active", "autoRenew": false, "endDate": "2024-01-07T23:59:59Z" }
    ]);

    let flags = classify_json(&batch, reference_now(), &MonitorThresholds::default()).unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0].subscription_id, "just-inside");
}

#[test]
fn test_end_before_start_is_still_classified() {
    let now = reference_now();
    let record = SubscriptionRecord::new("inverted", SubscriptionStatus::Active)
        .starting(now + Duration::days(90))
        .ending(now + Duration::days(2));

    let flags = classify_at(&[record], now);
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0].kind, FlagKind::ImminentExpiry);
}
