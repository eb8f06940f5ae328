//! Database operations for `register_sessions`.

use sqlx::PgPool;
use tillsync_pos::SessionRecord;

use crate::DbError;

/// Upserts a batch of register sessions keyed on the POS session id.
///
/// Duplicates are ignored silently (`ON CONFLICT DO NOTHING`): a closed
/// session's figures do not change, so the first write wins.
///
/// Returns the number of rows written (duplicates excluded).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any row's statement fails.
pub async fn upsert_register_sessions(
    pool: &PgPool,
    records: &[SessionRecord],
) -> Result<usize, DbError> {
    let mut written = 0usize;

    for record in records {
        let result = sqlx::query(
            "INSERT INTO register_sessions \
                 (session_id, shop_name, date, opening_date, closing_date, cash, \
                  opening_cash, closing_cash, total_sales, total_cash, total_card, \
                  total_other, difference, status, notes) \
             VALUES ($1, $2, $3, $4, $5, $6::numeric(12,2), \
                     $7::numeric(12,2), $8::numeric(12,2), $9::numeric(12,2), \
                     $10::numeric(12,2), $11::numeric(12,2), \
                     $12::numeric(12,2), $13::numeric(12,2), $14, $15) \
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(&record.session_id)
        .bind(&record.shop_name)
        .bind(&record.date)
        .bind(&record.opening_date)
        .bind(&record.closing_date)
        .bind(record.cash)
        .bind(record.opening_cash)
        .bind(record.closing_cash)
        .bind(record.total_sales)
        .bind(record.total_cash)
        .bind(record.total_card)
        .bind(record.total_other)
        .bind(record.difference)
        .bind(&record.status)
        .bind(&record.notes)
        .execute(pool)
        .await?;

        written += usize::try_from(result.rows_affected()).unwrap_or(0);
    }

    Ok(written)
}
