//! Subscription model
//!
//! Rows live in Postgres; the monitor sees them as `SubscriptionRecord`s
//! through `PgSubscriptionRepository`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use subman_core::monitor::{
    format_timestamp, parse_timestamp, ParseStatusError, RepositoryError, SubscriptionRecord,
    SubscriptionRepository, SubscriptionStatus,
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn into_record(self) -> Result<SubscriptionRecord, ParseStatusError> {
        Ok(SubscriptionRecord {
            id: self.id.to_string(),
            user_id: self.user_id.to_string(),
            product_id: self.product_id.to_string(),
            start_date: format_timestamp(self.start_date),
            end_date: format_timestamp(self.end_date),
            status: self.status.parse()?,
            auto_renew: self.auto_renew,
        })
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE status = 'active'")
            .fetch_one(pool)
            .await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscription {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub auto_renew: bool,
}

impl CreateSubscription {
    /// Record with an empty id, left for the repository to assign
    pub fn into_record(self) -> SubscriptionRecord {
        SubscriptionRecord::new("", self.status.unwrap_or(SubscriptionStatus::Pending))
            .owned_by(self.user_id.to_string(), self.product_id.to_string())
            .starting(self.start_date)
            .ending(self.end_date)
            .with_auto_renew(self.auto_renew)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscription {
    pub user_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SubscriptionStatus>,
    pub auto_renew: Option<bool>,
}

impl UpdateSubscription {
    pub fn apply(self, mut record: SubscriptionRecord) -> SubscriptionRecord {
        if let Some(user_id) = self.user_id {
            record.user_id = user_id.to_string();
        }
        if let Some(product_id) = self.product_id {
            record.product_id = product_id.to_string();
        }
        if let Some(start) = self.start_date {
            record.start_date = format_timestamp(start);
        }
        if let Some(end) = self.end_date {
            record.end_date = format_timestamp(end);
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(auto_renew) = self.auto_renew {
            record.auto_renew = auto_renew;
        }
        record
    }
}

/// Column values validated from a record
struct SubscriptionColumns {
    user_id: Uuid,
    product_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl SubscriptionColumns {
    fn from_record(record: &SubscriptionRecord) -> Result<Self, RepositoryError> {
        let start_date = timestamp_column("startDate", &record.start_date)?;
        let end_date = timestamp_column("endDate", &record.end_date)?;

        if end_date < start_date {
            return Err(RepositoryError::Invalid("endDate is before startDate".to_string()));
        }

        Ok(Self {
            user_id: uuid_column("userId", &record.user_id)?,
            product_id: uuid_column("productId", &record.product_id)?,
            start_date,
            end_date,
        })
    }
}

fn uuid_column(field: &str, raw: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(raw).map_err(|_| RepositoryError::Invalid(format!("{} is not a UUID: {:?}", field, raw)))
}

fn timestamp_column(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    parse_timestamp(raw).ok_or_else(|| RepositoryError::Invalid(format!("{} is not a timestamp: {:?}", field, raw)))
}

fn backend_error(err: sqlx::Error, id: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict(id.to_string()),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_check_violation() => {
            RepositoryError::Invalid(db.message().to_string())
        }
        _ => RepositoryError::Backend(err.to_string()),
    }
}

fn to_record(row: Subscription) -> Result<SubscriptionRecord, RepositoryError> {
    row.into_record().map_err(|e| RepositoryError::Backend(e.to_string()))
}

// ============================================================================
// POSTGRES REPOSITORY
// ============================================================================

#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn list(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions ORDER BY end_date ASC"
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend_error(e, ""))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping subscription {}: {}", id, e),
            }
        }
        Ok(records)
    }

    async fn find(&self, id: &str) -> Result<Option<SubscriptionRecord>, RepositoryError> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend_error(e, id))?;

        row.map(to_record).transpose()
    }

    async fn create(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepositoryError> {
        let id = if record.id.is_empty() {
            Uuid::new_v4()
        } else {
            uuid_column("id", &record.id)?
        };
        let columns = SubscriptionColumns::from_record(&record)?;

        let row = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (id, user_id, product_id, start_date, end_date, status, auto_renew)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#
        )
        .bind(id)
        .bind(columns.user_id)
        .bind(columns.product_id)
        .bind(columns.start_date)
        .bind(columns.end_date)
        .bind(record.status.as_str())
        .bind(record.auto_renew)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| backend_error(e, &id.to_string()))?;

        to_record(row)
    }

    async fn update(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepositoryError> {
        let id = Uuid::parse_str(&record.id).map_err(|_| RepositoryError::NotFound(record.id.clone()))?;
        let columns = SubscriptionColumns::from_record(&record)?;

        let row = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET user_id = $2,
                product_id = $3,
                start_date = $4,
                end_date = $5,
                status = $6,
                auto_renew = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(columns.user_id)
        .bind(columns.product_id)
        .bind(columns.start_date)
        .bind(columns.end_date)
        .bind(record.status.as_str())
        .bind(record.auto_renew)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error(e, &record.id))?
        .ok_or_else(|| RepositoryError::NotFound(record.id.clone()))?;

        to_record(row)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let uuid = Uuid::parse_str(id).map_err(|_| RepositoryError::NotFound(id.to_string()))?;

        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error(e, id))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(status: &str) -> Subscription {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Subscription {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            product_id: Uuid::nil(),
            start_date: at,
            end_date: at,
            status: status.to_string(),
            auto_renew: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_row_converts_to_record() {
        let record = row("cancelled").into_record().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Cancelled);
        assert_eq!(record.end_date, "2024-01-01T00:00:00Z");
        assert!(record.auto_renew);
    }

    #[test]
    fn test_unknown_row_status_is_error() {
        assert!(row("frozen").into_record().is_err());
    }

    #[test]
    fn test_columns_reject_bad_input() {
        let record = SubscriptionRecord::new("", SubscriptionStatus::Active).owned_by("not-a-uuid", Uuid::nil().to_string());
        assert!(matches!(
            SubscriptionColumns::from_record(&record.clone().starting(Utc::now()).ending(Utc::now())),
            Err(RepositoryError::Invalid(_))
        ));

        let mut record = SubscriptionRecord::new("", SubscriptionStatus::Active)
            .owned_by(Uuid::nil().to_string(), Uuid::nil().to_string());
        record.end_date = "soon".to_string();
        assert!(matches!(
            SubscriptionColumns::from_record(&record),
            Err(RepositoryError::Invalid(_))
        ));
    }

    #[test]
    fn test_columns_reject_end_before_start() {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let record = SubscriptionRecord::new("", SubscriptionStatus::Active)
            .owned_by(Uuid::nil().to_string(), Uuid::nil().to_string())
            .starting(at)
            .ending(at - chrono::Duration::days(1));
        assert!(matches!(
            SubscriptionColumns::from_record(&record),
            Err(RepositoryError::Invalid(_))
        ));
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = SubscriptionRecord::new("s1", SubscriptionStatus::Active)
            .owned_by("u1", "p1")
            .ending(at);

        let patch: UpdateSubscription =
            serde_json::from_str(r#"{"status":"cancelled","autoRenew":true}"#).unwrap();
        let updated = patch.apply(record);

        assert_eq!(updated.status, SubscriptionStatus::Cancelled);
        assert!(updated.auto_renew);
        assert_eq!(updated.user_id, "u1");
        assert_eq!(updated.end_date, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_create_defaults_to_pending() {
        let create: CreateSubscription = serde_json::from_value(serde_json::json!({
            "userId": Uuid::nil(),
            "productId": Uuid::nil(),
            "startDate": "2024-01-01T00:00:00Z",
            "endDate": "2024-02-01T00:00:00Z"
        }))
        .unwrap();

        let record = create.into_record();
        assert!(record.id.is_empty());
        assert_eq!(record.status, SubscriptionStatus::Pending);
        assert!(!record.auto_renew);
        assert_eq!(record.start_date, "2024-01-01T00:00:00Z");
    }
}
