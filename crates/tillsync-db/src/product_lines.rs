//! Database operations for `sale_products` (order line items).

use sqlx::PgPool;
use tillsync_pos::ProductLineRecord;

/// Upserts a batch of order lines keyed on `(order_id, product_id)`.
///
/// Rows with a product id deduplicate via `ON CONFLICT DO NOTHING`; rows
/// without one never conflict (NULLs are distinct under the unique
/// constraint) and are effectively insert-only. When the upsert statement
/// itself is rejected, the row falls back to a plain insert and individual
/// collisions are tolerated — best-effort dedup, not a guaranteed one.
///
/// Returns the number of rows processed without error. Never fails the
/// batch: a bad row is logged and skipped.
pub async fn upsert_product_lines(pool: &PgPool, records: &[ProductLineRecord]) -> usize {
    let mut processed = 0usize;

    for record in records {
        match upsert_one(pool, record).await {
            Ok(()) => processed += 1,
            Err(upsert_err) => {
                tracing::warn!(
                    order_id = %record.order_id,
                    error = %upsert_err,
                    "line upsert rejected; retrying as plain insert"
                );
                match insert_one(pool, record).await {
                    Ok(()) => processed += 1,
                    Err(insert_err) => {
                        tracing::warn!(
                            order_id = %record.order_id,
                            error = %insert_err,
                            "line insert failed; skipping row"
                        );
                    }
                }
            }
        }
    }

    processed
}

async fn upsert_one(pool: &PgPool, record: &ProductLineRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sale_products \
             (order_id, product_id, name, fixed_name, category, quantity, price, \
              total, discount, notes, modifiers, shop_name) \
         VALUES ($1, $2, $3, $4, $5, $6::numeric(12,2), $7::numeric(12,2), \
                 $8::numeric(12,2), $9::numeric(12,2), $10, $11, $12) \
         ON CONFLICT (order_id, product_id) DO NOTHING",
    )
    .bind(&record.order_id)
    .bind(&record.product_id)
    .bind(&record.name)
    .bind(&record.fixed_name)
    .bind(&record.category)
    .bind(record.quantity)
    .bind(record.price)
    .bind(record.total)
    .bind(record.discount)
    .bind(&record.notes)
    .bind(&record.modifiers)
    .bind(&record.shop_name)
    .execute(pool)
    .await?;

    Ok(())
}

async fn insert_one(pool: &PgPool, record: &ProductLineRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sale_products \
             (order_id, product_id, name, fixed_name, category, quantity, price, \
              total, discount, notes, modifiers, shop_name) \
         VALUES ($1, $2, $3, $4, $5, $6::numeric(12,2), $7::numeric(12,2), \
                 $8::numeric(12,2), $9::numeric(12,2), $10, $11, $12)",
    )
    .bind(&record.order_id)
    .bind(&record.product_id)
    .bind(&record.name)
    .bind(&record.fixed_name)
    .bind(&record.category)
    .bind(record.quantity)
    .bind(record.price)
    .bind(record.total)
    .bind(record.discount)
    .bind(&record.notes)
    .bind(&record.modifiers)
    .bind(&record.shop_name)
    .execute(pool)
    .await?;

    Ok(())
}
