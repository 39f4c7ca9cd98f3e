//! Dashboard handlers

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use subman_core::monitor::SubscriptionMonitor;

use crate::{AppState, AppResult};
use crate::models::{Order, Subscription, User};

#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_users: i64,
    pub total_orders: i64,
    pub revenue: f64,
    pub active_subscriptions: i64,
    pub flagged_subscriptions: usize,
    pub generated_at: i64,
}

/// Store totals for the admin home page
pub async fn metrics(State(state): State<AppState>) -> AppResult<Json<DashboardMetrics>> {
    let total_users = User::count(&state.pool).await?;
    let (total_orders, revenue) = Order::totals(&state.pool).await?;
    let active_subscriptions = Subscription::count_active(&state.pool).await?;

    let monitor = SubscriptionMonitor::new(state.subscriptions.clone(), state.config.monitor_thresholds());
    let report = monitor.scan(Utc::now()).await?;

    Ok(Json(DashboardMetrics {
        total_users,
        total_orders,
        revenue,
        active_subscriptions,
        flagged_subscriptions: report.flags.len(),
        generated_at: report.scanned_at.timestamp(),
    }))
}
