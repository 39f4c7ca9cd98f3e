//! Cross-check
//!
//! Compares generative flags against the deterministic classifier.
//! The classifier result is the reference: `missed` are flags the generator
//! failed to report, `spurious` are flags it reported without cause.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::client::TextGenerator;
use super::flows::smart_status_monitor;
use super::parse::GeneratedFlag;
use crate::logic::monitor::{classify_with_thresholds, Flag, MonitorThresholds, SubscriptionRecord};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCheckReport {
    pub reference_time: DateTime<Utc>,
    pub deterministic: Vec<Flag>,
    pub generative: Vec<GeneratedFlag>,
    /// Ids flagged by both
    pub agreed: Vec<String>,
    /// Ids flagged only by the classifier
    pub missed: Vec<String>,
    /// Ids flagged only by the generator
    pub spurious: Vec<String>,
    /// Set when the generator could not be consulted
    pub generative_error: Option<String>,
}

impl CrossCheckReport {
    pub fn is_consistent(&self) -> bool {
        self.generative_error.is_none() && self.missed.is_empty() && self.spurious.is_empty()
    }

    /// Share of deterministic flags the generator also reported
    pub fn recall(&self) -> f32 {
        let expected = self.agreed.len() + self.missed.len();
        if expected == 0 {
            return 1.0;
        }
        self.agreed.len() as f32 / expected as f32
    }
}

/// Run both variants over the same batch.
///
/// Never fails: a generator error is recorded and the deterministic flags
/// are still returned.
pub async fn cross_check(
    batch: &[SubscriptionRecord],
    now: DateTime<Utc>,
    thresholds: &MonitorThresholds,
    generator: &dyn TextGenerator,
) -> CrossCheckReport {
    let deterministic = classify_with_thresholds(batch, now, thresholds);

    let (generative, generative_error) =
        match smart_status_monitor(generator, batch, now, thresholds).await {
            Ok(flags) => (flags, None),
            Err(e) => {
                log::warn!("Generative status monitor failed: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };

    let expected = unique_ids(deterministic.iter().map(|f| f.subscription_id.as_str()));
    let reported = unique_ids(generative.iter().map(|f| f.subscription_id.as_str()));

    let expected_set: HashSet<&str> = expected.iter().copied().collect();
    let reported_set: HashSet<&str> = reported.iter().copied().collect();

    let agreed = expected.iter().filter(|id| reported_set.contains(*id)).map(|id| id.to_string()).collect();
    let missed: Vec<String> = expected.iter().filter(|id| !reported_set.contains(*id)).map(|id| id.to_string()).collect();
    let spurious: Vec<String> = reported.iter().filter(|id| !expected_set.contains(*id)).map(|id| id.to_string()).collect();

    if generative_error.is_none() && (!missed.is_empty() || !spurious.is_empty()) {
        log::info!(
            "Generative monitor disagrees: {} missed, {} spurious",
            missed.len(),
            spurious.len()
        );
    }

    CrossCheckReport {
        reference_time: now,
        deterministic,
        generative,
        agreed,
        missed,
        spurious,
        generative_error,
    }
}

/// First-seen order, duplicates removed
fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ai::testing::ScriptedGenerator;
    use crate::logic::ai::AiError;
    use crate::logic::monitor::SubscriptionStatus;
    use chrono::{Duration, TimeZone};

    fn batch(now: DateTime<Utc>) -> Vec<SubscriptionRecord> {
        vec![
            SubscriptionRecord::new("s1", SubscriptionStatus::Active).ending(now + Duration::days(3)),
            SubscriptionRecord::new("s2", SubscriptionStatus::Cancelled).with_auto_renew(true),
            SubscriptionRecord::new("s3", SubscriptionStatus::Expired),
            SubscriptionRecord::new("s4", SubscriptionStatus::Active).ending(now + Duration::days(30)),
        ]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_matching_generator_is_consistent() {
        let generator = ScriptedGenerator::replying(
            r#"[{"subscriptionId":"s1","reason":"expires in 3 days"},{"subscriptionId":"s2","reason":"cancelled with auto-renew"}]"#,
        );

        let report = cross_check(&batch(now()), now(), &MonitorThresholds::default(), &generator).await;
        assert!(report.is_consistent());
        assert_eq!(report.agreed, vec!["s1", "s2"]);
        assert_eq!(report.recall(), 1.0);
    }

    #[tokio::test]
    async fn test_disagreement_is_reported() {
        let generator = ScriptedGenerator::replying(
            r#"[{"subscriptionId":"s2","reason":"x"},{"subscriptionId":"s4","reason":"y"}]"#,
        );

        let report = cross_check(&batch(now()), now(), &MonitorThresholds::default(), &generator).await;
        assert!(!report.is_consistent());
        assert_eq!(report.agreed, vec!["s2"]);
        assert_eq!(report.missed, vec!["s1"]);
        assert_eq!(report.spurious, vec!["s4"]);
        assert_eq!(report.recall(), 0.5);
    }

    #[tokio::test]
    async fn test_generator_failure_keeps_deterministic_flags() {
        let generator = ScriptedGenerator::failing(AiError::NotConfigured);

        let report = cross_check(&batch(now()), now(), &MonitorThresholds::default(), &generator).await;
        assert_eq!(report.deterministic.len(), 2);
        assert!(report.generative.is_empty());
        assert_eq!(report.generative_error.as_deref(), Some("text generation is not configured"));
        assert!(!report.is_consistent());
        assert_eq!(generator.call_count(), 1);
    }
}
