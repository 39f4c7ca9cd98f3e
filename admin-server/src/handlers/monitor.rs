//! Subscription monitor handlers

use axum::{extract::{State, Query}, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use subman_core::ai::CrossCheckReport;
use subman_core::monitor::{classify_with_thresholds, decode_batch, MonitorReport, SubscriptionMonitor};

use crate::{AppState, AppResult};

/// Optional reference time; defaults to the current time
#[derive(Debug, Default, Deserialize)]
pub struct AtQuery {
    pub at: Option<DateTime<Utc>>,
}

impl AtQuery {
    fn now(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }
}

/// Classify stored subscriptions
pub async fn anomalies(
    State(state): State<AppState>,
    Query(query): Query<AtQuery>,
) -> AppResult<Json<MonitorReport>> {
    let monitor = SubscriptionMonitor::new(state.subscriptions.clone(), state.config.monitor_thresholds());
    let report = monitor.scan(query.now()).await?;
    Ok(Json(report))
}

/// Classify a batch supplied in the request body
pub async fn classify(
    State(state): State<AppState>,
    Query(query): Query<AtQuery>,
    Json(batch): Json<serde_json::Value>,
) -> AppResult<Json<MonitorReport>> {
    let now = query.now();
    let records = decode_batch(&batch)?;
    let flags = classify_with_thresholds(&records, now, &state.config.monitor_thresholds());

    Ok(Json(MonitorReport::new(now, records.len(), flags)))
}

/// Compare the classifier with the AI assistant on stored subscriptions
pub async fn cross_check(
    State(state): State<AppState>,
    Query(query): Query<AtQuery>,
) -> AppResult<Json<CrossCheckReport>> {
    let monitor = SubscriptionMonitor::new(state.subscriptions.clone(), state.config.monitor_thresholds());
    let report = monitor
        .scan_with_cross_check(query.now(), state.ai.as_ref())
        .await?;

    if let Some(err) = &report.generative_error {
        tracing::warn!("Cross-check ran without the AI assistant: {}", err);
    }
    Ok(Json(report))
}
