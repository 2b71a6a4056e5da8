//! # Component Repository
//!
//! Pack composition: which products a pack bundles, and how many of each.
//!
//! ```text
//! product_components
//! ┌──────────┬──────────────┬───────────────────┐
//! │ pack_id  │ component_id │ quantity_per_pack │
//! ├──────────┼──────────────┼───────────────────┤
//! │ dj-set   │ speaker      │ 2                 │
//! │ dj-set   │ mixer        │ 1                 │
//! └──────────┴──────────────┴───────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use rental_core::{ComponentSpec, PackComponent, Product};

/// Join row: one component product plus its per-pack quantity.
#[derive(Debug, sqlx::FromRow)]
struct ComponentRow {
    quantity_per_pack: i64,
    #[sqlx(flatten)]
    component: Product,
}

impl From<ComponentRow> for PackComponent {
    fn from(row: ComponentRow) -> Self {
        PackComponent {
            quantity_per_pack: row.quantity_per_pack,
            component: row.component,
        }
    }
}

/// Repository for pack composition.
#[derive(Debug, Clone)]
pub struct ComponentRepository {
    pool: SqlitePool,
}

impl ComponentRepository {
    /// Creates a new ComponentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ComponentRepository { pool }
    }

    /// Lists a pack's components joined with their products, in a stable
    /// order (component name, then id).
    pub async fn components_of_pack(&self, pack_id: &str) -> DbResult<Vec<PackComponent>> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT
                pc.quantity_per_pack,
                p.id, p.sku, p.slug, p.name, p.price_per_day_cents,
                p.real_stock, p.stock, p.available_stock,
                p.is_pack, p.is_active, p.status, p.created_at, p.updated_at
            FROM product_components pc
            INNER JOIN products p ON p.id = pc.component_id
            WHERE pc.pack_id = ?1
            ORDER BY p.name, p.id
            "#,
        )
        .bind(pack_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(pack_id = %pack_id, count = rows.len(), "Loaded pack components");
        Ok(rows.into_iter().map(PackComponent::from).collect())
    }

    /// Ids of the packs that list `component_id`.
    pub async fn packs_containing(&self, component_id: &str) -> DbResult<Vec<String>> {
        let packs: Vec<String> = sqlx::query_scalar(
            "SELECT pack_id FROM product_components WHERE component_id = ?1 ORDER BY pack_id",
        )
        .bind(component_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(packs)
    }

    /// Replaces a pack's component set in one transaction.
    ///
    /// Either the whole new set is stored or nothing changes.
    pub async fn replace_components(&self, pack_id: &str, specs: &[ComponentSpec]) -> DbResult<()> {
        debug!(pack_id = %pack_id, count = specs.len(), "Replacing pack components");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_components WHERE pack_id = ?1")
            .bind(pack_id)
            .execute(&mut *tx)
            .await?;

        for spec in specs {
            sqlx::query(
                "INSERT INTO product_components (pack_id, component_id, quantity_per_pack) \
                 VALUES (?1, ?2, ?3)",
            )
            .bind(pack_id)
            .bind(&spec.component_id)
            .bind(spec.quantity_per_pack)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use chrono::Utc;
    use rental_core::ProductStatus;

    fn product(id: &str, name: &str, is_pack: bool) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            sku: format!("SKU-{id}"),
            slug: id.to_string(),
            name: name.to_string(),
            price_per_day_cents: 1000,
            real_stock: 4,
            stock: 4,
            available_stock: 4,
            is_pack,
            is_active: true,
            status: ProductStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    fn spec(id: &str, qty: i64) -> ComponentSpec {
        ComponentSpec {
            component_id: id.to_string(),
            quantity_per_pack: qty,
        }
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for p in [
            product("dj-set", "DJ Set", true),
            product("speaker", "Speaker", false),
            product("mixer", "Mixer", false),
        ] {
            db.products().insert(&p).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_replace_and_list() {
        let db = seeded().await;
        let repo = db.components();

        repo.replace_components("dj-set", &[spec("speaker", 2), spec("mixer", 1)])
            .await
            .unwrap();

        let components = repo.components_of_pack("dj-set").await.unwrap();
        let names: Vec<_> = components.iter().map(|c| c.component.name.as_str()).collect();
        assert_eq!(names, ["Mixer", "Speaker"]);
        assert_eq!(components[1].quantity_per_pack, 2);

        assert_eq!(repo.packs_containing("speaker").await.unwrap(), ["dj-set"]);

        repo.replace_components("dj-set", &[spec("mixer", 3)]).await.unwrap();
        let components = repo.components_of_pack("dj-set").await.unwrap();
        assert_eq!(components.len(), 1);
        assert!(repo.packs_containing("speaker").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_is_atomic() {
        let db = seeded().await;
        let repo = db.components();
        repo.replace_components("dj-set", &[spec("speaker", 2)]).await.unwrap();

        // unknown component fails the FK check; the old set survives
        let err = repo
            .replace_components("dj-set", &[spec("mixer", 1), spec("ghost", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let components = repo.components_of_pack("dj-set").await.unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].component.id, "speaker");
    }

    #[tokio::test]
    async fn test_empty_pack() {
        let db = seeded().await;
        assert!(db
            .components()
            .components_of_pack("dj-set")
            .await
            .unwrap()
            .is_empty());
    }
}
