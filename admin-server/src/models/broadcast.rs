//! Broadcast audience
//!
//! Selects the bot users a broadcast would reach. Delivery is out of scope
//! here; the result is the list of Telegram chat ids.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionActivity {
    /// Users with at least one subscription
    PurchasedAny,
    /// Users with no subscription at all
    NotPurchasedAny,
}

/// Audience filters; all given filters must hold
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudienceFilter {
    #[serde(default, alias = "filterSubscriptionActivity")]
    pub subscription_activity: Option<SubscriptionActivity>,
    /// Users who ordered any of these products
    #[serde(default, alias = "filterPurchasedProducts")]
    pub purchased_products: Vec<Uuid>,
    /// Users who ordered any product in these categories
    #[serde(default, alias = "selectedCategories")]
    pub categories: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastAudience {
    pub user_count: usize,
    pub telegram_ids: Vec<i64>,
}

impl AudienceFilter {
    pub fn query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT u.telegram_id FROM users u WHERE TRUE");

        if let Some(activity) = self.subscription_activity {
            qb.push(match activity {
                SubscriptionActivity::PurchasedAny => " AND EXISTS",
                SubscriptionActivity::NotPurchasedAny => " AND NOT EXISTS",
            });
            qb.push(" (SELECT 1 FROM subscriptions s WHERE s.user_id = u.id)");
        }

        if !self.purchased_products.is_empty() {
            qb.push(" AND EXISTS (SELECT 1 FROM orders o WHERE o.user_id = u.id AND o.product_id = ANY(");
            qb.push_bind(self.purchased_products.clone());
            qb.push("))");
        }

        if !self.categories.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM orders o JOIN products p ON p.id = o.product_id \
                 WHERE o.user_id = u.id AND p.category_id = ANY(",
            );
            qb.push_bind(self.categories.clone());
            qb.push("))");
        }

        qb.push(" ORDER BY u.created_at");
        qb
    }

    pub async fn resolve(&self, pool: &PgPool) -> Result<BroadcastAudience, sqlx::Error> {
        let mut qb = self.query();
        let telegram_ids: Vec<i64> = qb.build_query_scalar().fetch_all(pool).await?;

        Ok(BroadcastAudience {
            user_count: telegram_ids.len(),
            telegram_ids,
        })
    }
}
