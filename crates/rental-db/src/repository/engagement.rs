//! # Engagement Repository
//!
//! Per-product rows that carry no rental history: reviews, favorites,
//! interactions and the demand analytics snapshot. A hard delete removes
//! them together with the product.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct EngagementRepository {
    pool: SqlitePool,
}

impl EngagementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EngagementRepository { pool }
    }

    /// Stores a review. `rating` must be 1..=5 (CHECK constraint).
    pub async fn add_review(&self, product_id: &str, rating: i64, body: Option<&str>) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO reviews (id, product_id, rating, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(product_id)
        .bind(rating)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Marks a product as a user's favorite. Idempotent per user.
    pub async fn add_favorite(&self, product_id: &str, user_id: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO favorites (id, product_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_interaction(&self, product_id: &str, kind: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO product_interactions (id, product_id, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(kind)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Writes the analytics snapshot, replacing any previous one.
    pub async fn upsert_analytics(&self, product_id: &str, views: i64, rentals: i64) -> DbResult<()> {
        let demand_score = if views == 0 {
            0.0
        } else {
            rentals as f64 / views as f64
        };

        sqlx::query(
            r#"
            INSERT INTO product_demand_analytics (product_id, views, rentals, demand_score, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(product_id) DO UPDATE SET
                views = excluded.views,
                rentals = excluded.rentals,
                demand_score = excluded.demand_score,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(views)
        .bind(rentals)
        .bind(demand_score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
