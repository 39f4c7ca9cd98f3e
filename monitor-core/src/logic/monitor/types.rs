//! Monitor Types
//!
//! Data structures for subscription monitoring. No rule logic lives here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ParseStatusError;

// ============================================================================
// SUBSCRIPTION STATUS
// ============================================================================

/// Lifecycle status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Pending,
    #[serde(alias = "canceled")]
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 5] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Inactive,
        SubscriptionStatus::Pending,
        SubscriptionStatus::Cancelled,
        SubscriptionStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Cancelled or expired: the subscription has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Cancelled | SubscriptionStatus::Expired)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "pending" => Ok(SubscriptionStatus::Pending),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// SUBSCRIPTION RECORD
// ============================================================================

/// Snapshot of one subscription as supplied by the repository.
///
/// Dates are kept as the text the repository produced. They are parsed on
/// demand so that a single malformed value only affects its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(deserialize_with = "record_id")]
    pub id: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub product_id: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub start_date: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub end_date: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub auto_renew: bool,
}

impl SubscriptionRecord {
    /// Record with no owner and no dates
    pub fn new(id: impl Into<String>, status: SubscriptionStatus) -> Self {
        Self {
            id: id.into(),
            user_id: String::new(),
            product_id: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            status,
            auto_renew: false,
        }
    }

    pub fn owned_by(mut self, user_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self.product_id = product_id.into();
        self
    }

    pub fn starting(mut self, at: DateTime<Utc>) -> Self {
        self.start_date = format_timestamp(at);
        self
    }

    pub fn ending(mut self, at: DateTime<Utc>) -> Self {
        self.end_date = format_timestamp(at);
        self
    }

    pub fn with_auto_renew(mut self, auto_renew: bool) -> Self {
        self.auto_renew = auto_renew;
        self
    }

    /// Parsed start date, `None` when missing or unparsable
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_date)
    }

    /// Parsed end date, `None` when missing or unparsable
    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.end_date)
    }
}

// ============================================================================
// FLAGS
// ============================================================================

/// Why a subscription was flagged. Variants follow the order `evaluate` checks them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Cancelled or expired, but still set to renew automatically
    InconsistentTerminalState,
    /// Active and ending inside the lookahead window
    ImminentExpiry,
    /// Active although the end date has already passed
    StaleActive,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::InconsistentTerminalState => "inconsistent_terminal_state",
            FlagKind::ImminentExpiry => "imminent_expiry",
            FlagKind::StaleActive => "stale_active",
        }
    }

}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription that needs attention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub subscription_id: String,
    pub kind: FlagKind,
    pub reason: String,
}

impl Flag {
    pub fn new(subscription_id: impl Into<String>, kind: FlagKind, reason: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            kind,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Parse a repository timestamp into UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// (both read as UTC) and bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical text form used when records are built from typed dates
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Ids accept strings and numbers; null or blank leaves the record unidentifiable
fn record_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => return Err(serde::de::Error::custom(format!("invalid subscription id: {}", other))),
    };

    if id.trim().is_empty() {
        return Err(serde::de::Error::custom("subscription id must not be empty"));
    }
    Ok(id)
}

/// Accept strings, numbers and null for opaque text fields.
///
/// Storefront ids arrive as numbers from some sources, and a wrongly typed
/// date must not make the whole record undecodable.
fn opaque_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_parsing_accepts_both_spellings() {
        assert_eq!("cancelled".parse::<SubscriptionStatus>(), Ok(SubscriptionStatus::Cancelled));
        assert_eq!("Canceled".parse::<SubscriptionStatus>(), Ok(SubscriptionStatus::Cancelled));
        assert!("paused".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-08T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-08T03:00:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-08 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-08"), Some(expected));
        assert_eq!(parse_timestamp("next tuesday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_record_deserializes_numeric_ids_and_missing_fields() {
        let record: SubscriptionRecord = serde_json::from_value(serde_json::json!({
            "id": 42,
            "userId": 7,
            "status": "canceled",
            "endDate": 1704067200
        }))
        .unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.user_id, "7");
        assert_eq!(record.product_id, "");
        assert_eq!(record.status, SubscriptionStatus::Cancelled);
        assert!(!record.auto_renew);
        // Epoch seconds are not a supported date format
        assert_eq!(record.end_at(), None);
    }

    #[test]
    fn test_record_without_usable_id_is_rejected() {
        for id in [serde_json::Value::Null, serde_json::json!(""), serde_json::json!("   "), serde_json::json!(true)] {
            let result = serde_json::from_value::<SubscriptionRecord>(serde_json::json!({
                "id": id,
                "status": "cancelled",
                "autoRenew": true
            }));
            assert!(result.is_err(), "id {} should not decode", id);
        }
    }

    #[test]
    fn test_flag_serializes_camel_case() {
        let flag = Flag::new("s1", FlagKind::ImminentExpiry, "soon");
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["subscriptionId"], "s1");
        assert_eq!(json["kind"], "imminent_expiry");
    }
}
