//! User model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

/// Telegram bot customer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// User row with activity counters for the admin list
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserWithDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub orders_count: i64,
    pub active_subscriptions_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(range(min = 1))]
    pub telegram_id: i64,
    #[validate(length(max = 255))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub first_name: Option<String>,
    #[validate(length(max = 255))]
    pub last_name: Option<String>,
    pub balance: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(max = 255))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub first_name: Option<String>,
    #[validate(length(max = 255))]
    pub last_name: Option<String>,
    pub balance: Option<f64>,
}

impl User {
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, balance)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(data.telegram_id)
        .bind(&data.username)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.balance.unwrap_or(0.0))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<UserWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, UserWithDetails>(
            r#"
            SELECT u.*,
                (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS orders_count,
                (SELECT COUNT(*) FROM subscriptions s
                    WHERE s.user_id = u.id AND s.status = 'active') AS active_subscriptions_count
            FROM users u
            ORDER BY u.created_at DESC
            LIMIT $1 OFFSET $2
            "#
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateUser) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                balance = COALESCE($5, balance)
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(&data.username)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.balance)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}
