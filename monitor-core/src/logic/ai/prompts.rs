//! Prompt builders
//!
//! Each flow is a (system, user) message pair.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::logic::monitor::{format_timestamp, MonitorThresholds, SubscriptionRecord};

// ============================================================================
// BROADCAST MESSAGE
// ============================================================================

pub fn broadcast_system_prompt() -> String {
    "You are a marketing copywriter for a subscription service that sells through a Telegram bot. \
Write a short, friendly and engaging message that the bot will send to users. \
Avoid overly formal language and use emoji where they improve the message. \
Write in the language of the instructions. \
Reply with the message text only."
        .to_string()
}

pub fn broadcast_user_message(instructions: &str, target_audience: Option<&str>) -> String {
    let mut out = format!("Instructions:\n\"{}\"\n", instructions.trim());

    if let Some(audience) = target_audience.map(str::trim).filter(|a| !a.is_empty()) {
        let _ = write!(out, "\nTarget audience: \"{}\"\n", audience);
    }

    out
}

// ============================================================================
// SALES ANALYSIS
// ============================================================================

pub fn sales_system_prompt() -> String {
    "You are a sales analyst and an experienced salesperson for SubMan, a subscription store. \
Assume you have access to all sales, product, category, user and order data.\n\
Tasks:\n\
1. Sales reports: understand requested periods (\"last month\", \"last quarter\", explicit dates), \
break down by product or category when asked, include key metrics (revenue, units sold, \
top products and categories) and short conclusions.\n\
2. Recommendations: when asked what sells best or what to promote, give concrete suggestions, \
consider seasonality and trends, and propose promotions.\n\
If the request is unclear or needs data the store cannot have, say so politely.\n\
Answer in the language of the request, formatted as Markdown with headings and lists."
        .to_string()
}

pub fn sales_user_message(query: &str) -> String {
    format!("Request:\n\"{}\"", query.trim())
}

// ============================================================================
// STATUS MONITOR
// ============================================================================

pub fn status_monitor_system_prompt(thresholds: &MonitorThresholds) -> String {
    let mut out = String::with_capacity(768);
    out.push_str(
        "You analyse subscriptions of a subscription store and flag the ones that need attention.\n\
Rules, checked in order; report each subscription at most once:\n\
1. Status is cancelled or expired AND autoRenew is true.\n",
    );
    let _ = writeln!(
        out,
        "2. Status is active AND the end date is at or after the reference time and less than {} hours after it.",
        thresholds.lookahead().num_hours()
    );
    if thresholds.flag_stale_active {
        out.push_str("3. Status is active AND the end date is before the reference time.\n");
    }
    out.push_str(
        "Never flag pending or inactive subscriptions.\n\
Reply with a JSON array only, for example \
[{\"subscriptionId\": \"s1\", \"reason\": \"expires in 3 days\"}]. \
Reply with [] when nothing matches.",
    );
    out
}

/// Compact line-per-subscription listing
pub fn status_monitor_user_message(batch: &[SubscriptionRecord], now: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(64 + batch.len() * 160);
    let _ = writeln!(out, "Reference time: {}", format_timestamp(now));
    out.push_str("Subscriptions:\n");

    for record in batch {
        let _ = writeln!(
            out,
            "- ID: {}, User ID: {}, Product ID: {}, Start Date: {}, End Date: {}, Status: {}, Auto Renew: {}",
            record.id,
            record.user_id,
            record.product_id,
            record.start_date,
            record.end_date,
            record.status,
            record.auto_renew
        );
    }

    out
}
