//! Subscription Monitor Service
//!
//! Fetches the current batch from a repository and runs the classifier.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::classifier::classify_with_thresholds;
use super::error::RepositoryError;
use super::repository::SubscriptionRepository;
use super::rules::MonitorThresholds;
use super::types::{Flag, FlagKind};
use crate::logic::ai::{cross_check, CrossCheckReport, TextGenerator};

/// Result of one repository scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorReport {
    pub scanned_at: DateTime<Utc>,
    pub total_subscriptions: usize,
    pub inconsistent_count: usize,
    pub expiring_count: usize,
    pub stale_count: usize,
    pub flags: Vec<Flag>,
}

impl MonitorReport {
    pub fn new(scanned_at: DateTime<Utc>, total_subscriptions: usize, flags: Vec<Flag>) -> Self {
        let count = |kind: FlagKind| flags.iter().filter(|f| f.kind == kind).count();

        Self {
            scanned_at,
            total_subscriptions,
            inconsistent_count: count(FlagKind::InconsistentTerminalState),
            expiring_count: count(FlagKind::ImminentExpiry),
            stale_count: count(FlagKind::StaleActive),
            flags,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Repository + thresholds
pub struct SubscriptionMonitor<R: ?Sized> {
    repository: Arc<R>,
    thresholds: MonitorThresholds,
}

impl<R: SubscriptionRepository + ?Sized> SubscriptionMonitor<R> {
    pub fn new(repository: Arc<R>, thresholds: MonitorThresholds) -> Self {
        Self { repository, thresholds }
    }

    /// Fetch the batch and classify it against `now`
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<MonitorReport, RepositoryError> {
        let batch = self.repository.list().await?;
        let flags = classify_with_thresholds(&batch, now, &self.thresholds);

        for flag in &flags {
            log::debug!("Flagged {} ({}): {}", flag.subscription_id, flag.kind, flag.reason);
        }
        log::info!(
            "Subscription scan: {} records, {} flagged",
            batch.len(),
            flags.len()
        );

        Ok(MonitorReport::new(now, batch.len(), flags))
    }

    /// Fetch the batch and compare the classifier with a text generator.
    ///
    /// Only repository failures are returned as errors; generator failures
    /// are recorded inside the report.
    pub async fn scan_with_cross_check(
        &self,
        now: DateTime<Utc>,
        generator: &dyn TextGenerator,
    ) -> Result<CrossCheckReport, RepositoryError> {
        let batch = self.repository.list().await?;
        Ok(cross_check(&batch, now, &self.thresholds, generator).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::monitor::{InMemorySubscriptionRepository, SubscriptionRecord, SubscriptionStatus};
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_scan_counts_by_kind() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let repo = Arc::new(InMemorySubscriptionRepository::with_records(vec![
            SubscriptionRecord::new("a", SubscriptionStatus::Active).ending(now + Duration::days(1)),
            SubscriptionRecord::new("b", SubscriptionStatus::Expired).with_auto_renew(true),
            SubscriptionRecord::new("c", SubscriptionStatus::Active).ending(now - Duration::days(1)),
            SubscriptionRecord::new("d", SubscriptionStatus::Pending).with_auto_renew(true),
        ]));

        let monitor = SubscriptionMonitor::new(repo.clone(), MonitorThresholds::default());
        let report = monitor.scan(now).await.unwrap();
        assert_eq!(report.total_subscriptions, 4);
        assert_eq!(report.expiring_count, 1);
        assert_eq!(report.inconsistent_count, 1);
        assert_eq!(report.stale_count, 0);

        let strict = SubscriptionMonitor::new(repo, MonitorThresholds::high_sensitivity());
        assert_eq!(strict.scan(now).await.unwrap().stale_count, 1);
    }

    #[tokio::test]
    async fn test_scan_of_empty_repository_is_clean() {
        let repo: Arc<dyn SubscriptionRepository> = Arc::new(InMemorySubscriptionRepository::new());
        let monitor = SubscriptionMonitor::new(repo, MonitorThresholds::default());
        assert!(monitor.scan(Utc::now()).await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn test_scan_with_cross_check_reads_the_repository() {
        use crate::logic::ai::testing::ScriptedGenerator;

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let repo = Arc::new(InMemorySubscriptionRepository::with_records(vec![
            SubscriptionRecord::new("a", SubscriptionStatus::Active).ending(now + Duration::days(1)),
            SubscriptionRecord::new("b", SubscriptionStatus::Active).ending(now + Duration::days(60)),
        ]));
        let generator = ScriptedGenerator::replying(r#"[{"subscriptionId":"a","reason":"ends tomorrow"}]"#);

        let monitor = SubscriptionMonitor::new(repo, MonitorThresholds::default());
        let report = monitor.scan_with_cross_check(now, &generator).await.unwrap();

        assert!(report.is_consistent());
        assert_eq!(report.agreed, vec!["a"]);
        assert_eq!(generator.call_count(), 1);
    }
}
