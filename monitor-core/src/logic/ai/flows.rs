//! AI Flows
//!
//! Prompt/response round trips built on a [`TextGenerator`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{AiError, TextGenerator};
use super::parse::{parse_generated_flags, GeneratedFlag};
use super::prompts;
use crate::logic::monitor::{MonitorThresholds, SubscriptionRecord};

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastMessageRequest {
    pub instructions: String,
    #[serde(default, alias = "targetAudienceDescription")]
    pub target_audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastMessage {
    pub generated_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalysisRequest {
    #[serde(alias = "userQuery")]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub report: String,
}

// ============================================================================
// FLOWS
// ============================================================================

/// Draft a Telegram broadcast from free-form instructions
pub async fn generate_broadcast_message(
    generator: &dyn TextGenerator,
    request: &BroadcastMessageRequest,
) -> Result<BroadcastMessage, AiError> {
    if request.instructions.trim().is_empty() {
        return Err(AiError::InvalidInput("instructions must not be empty".to_string()));
    }

    let reply = generator
        .generate(
            &prompts::broadcast_system_prompt(),
            &prompts::broadcast_user_message(&request.instructions, request.target_audience.as_deref()),
        )
        .await?;

    Ok(BroadcastMessage {
        generated_message: non_blank(reply)?,
    })
}

/// Answer a sales question with a Markdown report
pub async fn analyze_sales(
    generator: &dyn TextGenerator,
    request: &SalesAnalysisRequest,
) -> Result<SalesReport, AiError> {
    if request.query.trim().is_empty() {
        return Err(AiError::InvalidInput("query must not be empty".to_string()));
    }

    let reply = generator
        .generate(&prompts::sales_system_prompt(), &prompts::sales_user_message(&request.query))
        .await?;

    Ok(SalesReport {
        report: non_blank(reply)?,
    })
}

/// Ask the generator to flag the batch.
///
/// Ids the generator invents are dropped, as are repeated ids. The result is
/// advisory; the deterministic classifier stays authoritative.
pub async fn smart_status_monitor(
    generator: &dyn TextGenerator,
    batch: &[SubscriptionRecord],
    now: DateTime<Utc>,
    thresholds: &MonitorThresholds,
) -> Result<Vec<GeneratedFlag>, AiError> {
    if batch.is_empty() {
        return Ok(vec![]);
    }

    let reply = generator
        .generate(
            &prompts::status_monitor_system_prompt(thresholds),
            &prompts::status_monitor_user_message(batch, now),
        )
        .await?;

    let known: HashSet<&str> = batch.iter().map(|r| r.id.as_str()).collect();
    let mut seen = HashSet::new();

    let flags: Vec<GeneratedFlag> = parse_generated_flags(&reply)
        .into_iter()
        .filter(|flag| {
            if !known.contains(flag.subscription_id.as_str()) {
                log::warn!("Generator flagged unknown subscription {}", flag.subscription_id);
                return false;
            }
            seen.insert(flag.subscription_id.clone())
        })
        .collect();

    Ok(flags)
}

fn non_blank(reply: String) -> Result<String, AiError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}
