//! The per-shop sync pipeline.
//!
//! Credential lookup, sign-in, the three windowed fetches, projection, and
//! the idempotent upserts — all inside one fault boundary. [`sync_shop`]
//! never returns an error: whatever goes wrong is folded into the returned
//! [`ShopResult`] so one broken shop cannot take down the run. Within a
//! shop, the three record kinds are independent fault boundaries of their
//! own: a fetch or write failure for one kind zeroes that kind only.

use serde::Serialize;
use sqlx::PgPool;

use tillsync_core::{DateWindow, ShopConfig, SyncMode};
use tillsync_pos::{project_order, project_product_line, project_session, PosClient};

/// Outcome of one shop's pipeline, serialized into the run-log details.
#[derive(Debug, Clone, Serialize)]
pub struct ShopResult {
    pub shop_key: String,
    pub shop_name: String,
    /// False only when the shop never got past authentication; per-kind
    /// failures leave this true and surface in `error` instead.
    pub success: bool,
    /// Orders fetched and persisted inside the window; zero when the
    /// order upsert failed even if orders were fetched.
    pub orders: i32,
    /// Orders actually written (inserted or refreshed) this run.
    pub new_orders: i32,
    pub products: i32,
    pub sessions: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShopResult {
    fn failed(shop: &ShopConfig, error: String) -> Self {
        Self {
            shop_key: shop.key.clone(),
            shop_name: shop.name.clone(),
            success: false,
            orders: 0,
            new_orders: 0,
            products: 0,
            sessions: 0,
            error: Some(error),
        }
    }
}

/// Pull the login email out of a credential blob, falling back to the
/// roster email when the blob carries none. The blob itself is otherwise
/// opaque and is never logged.
fn credential_email(credential: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(credential)
        .ok()
        .and_then(|v| {
            v.get("user")
                .and_then(|u| u.get("email"))
                .and_then(|e| e.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// Run the full pipeline for one shop.
///
/// Only a missing credential or a failed sign-in aborts the shop. Past
/// that point every record kind is fetched, projected, and written on its
/// own: a failure for one kind is logged, noted in the result's `error`,
/// and counted as zero, while the other kinds still complete.
pub async fn sync_shop(
    pool: &PgPool,
    client: &PosClient,
    shop: &ShopConfig,
    window: &DateWindow,
    mode: SyncMode,
) -> ShopResult {
    let credential_var = shop.credential_env_var();
    let Ok(credential) = std::env::var(&credential_var) else {
        tracing::warn!(shop = %shop.key, var = %credential_var, "credential env var is not set");
        return ShopResult::failed(shop, format!("credential {credential_var} is not configured"));
    };

    let email = credential_email(&credential, &shop.email);

    let token = match client.sign_in(&credential).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(shop = %shop.key, error = %e, "sign-in failed");
            return ShopResult::failed(shop, format!("sign-in failed: {e}"));
        }
    };

    let mut kind_errors: Vec<String> = Vec::new();

    // Each kind degrades to empty on fetch failure; the others still run.
    let raw_orders = match client.fetch_orders(&email, &token, window).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::warn!(shop = %shop.key, error = %e, "order fetch failed, continuing without");
            kind_errors.push(format!("order fetch failed: {e}"));
            Vec::new()
        }
    };
    let raw_products = match client.fetch_product_lines(&email, &token, window).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(shop = %shop.key, error = %e, "product line fetch failed, continuing without");
            kind_errors.push(format!("product line fetch failed: {e}"));
            Vec::new()
        }
    };
    let raw_sessions = match client.fetch_sessions(&email, &token, window).await {
        Ok(sessions) => sessions,
        Err(e) => {
            tracing::warn!(shop = %shop.key, error = %e, "session fetch failed, continuing without");
            kind_errors.push(format!("session fetch failed: {e}"));
            Vec::new()
        }
    };

    let orders: Vec<_> = raw_orders
        .into_iter()
        .map(|raw| project_order(raw, shop))
        .collect();
    let products: Vec<_> = raw_products
        .into_iter()
        .map(|raw| project_product_line(raw, shop))
        .collect();
    let sessions: Vec<_> = raw_sessions
        .into_iter()
        .map(|raw| project_session(raw, shop))
        .collect();

    let (orders_count, new_orders) = if orders.is_empty() {
        (0, 0)
    } else {
        match tillsync_db::upsert_sale_orders(pool, &orders).await {
            Ok(written) => (
                i32::try_from(orders.len()).unwrap_or(i32::MAX),
                i32::try_from(written.len()).unwrap_or(i32::MAX),
            ),
            Err(e) => {
                tracing::error!(shop = %shop.key, error = %e, "order upsert failed, continuing with other kinds");
                kind_errors.push(format!("order upsert failed: {e}"));
                (0, 0)
            }
        }
    };

    let products_written = tillsync_db::upsert_product_lines(pool, &products).await;
    let products_written = i32::try_from(products_written).unwrap_or(i32::MAX);

    let sessions_written = match tillsync_db::upsert_register_sessions(pool, &sessions).await {
        Ok(count) => i32::try_from(count).unwrap_or(i32::MAX),
        Err(e) => {
            tracing::warn!(shop = %shop.key, error = %e, "session upsert failed, continuing without");
            kind_errors.push(format!("session upsert failed: {e}"));
            0
        }
    };

    // Checkpoints are observability only: scheduled runs that persisted
    // orders refresh them, and a write failure never fails the shop.
    if mode == SyncMode::Auto && orders_count > 0 {
        if let Err(e) = tillsync_db::upsert_checkpoint(
            pool,
            &shop.key,
            &shop.name,
            &window.to_date,
            orders_count,
            products_written,
        )
        .await
        {
            tracing::warn!(shop = %shop.key, error = %e, "checkpoint write failed");
        }
    }

    tracing::info!(
        shop = %shop.key,
        orders = orders_count,
        new_orders,
        products = products_written,
        sessions = sessions_written,
        "shop sync finished"
    );

    ShopResult {
        shop_key: shop.key.clone(),
        shop_name: shop.name.clone(),
        success: true,
        orders: orders_count,
        new_orders,
        products: products_written,
        sessions: sessions_written,
        error: (!kind_errors.is_empty()).then(|| kind_errors.join("; ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_email_prefers_blob_email() {
        let blob = r#"{"user":{"email":"override@linisco.com.ar","password":"s3cret"}}"#;
        assert_eq!(
            credential_email(blob, "66220@linisco.com.ar"),
            "override@linisco.com.ar"
        );
    }

    #[test]
    fn credential_email_falls_back_when_blob_has_none() {
        let blob = r#"{"user":{"password":"s3cret"}}"#;
        assert_eq!(
            credential_email(blob, "66220@linisco.com.ar"),
            "66220@linisco.com.ar"
        );
    }

    #[test]
    fn credential_email_falls_back_on_non_json_blob() {
        assert_eq!(
            credential_email("not json at all", "fallback@linisco.com.ar"),
            "fallback@linisco.com.ar"
        );
    }

    #[test]
    fn failed_result_carries_shop_identity() {
        let shop = ShopConfig {
            key: "SC".to_string(),
            code: "66220".to_string(),
            name: "Subway Corrientes".to_string(),
            email: "66220@linisco.com.ar".to_string(),
        };

        let result = ShopResult::failed(&shop, "sign-in failed".to_string());
        assert_eq!(result.shop_key, "SC");
        assert_eq!(result.shop_name, "Subway Corrientes");
        assert!(!result.success);
        assert_eq!(result.orders, 0);
        assert_eq!(result.error.as_deref(), Some("sign-in failed"));
    }

    #[test]
    fn successful_result_omits_error_field_in_json() {
        let result = ShopResult {
            shop_key: "SC".to_string(),
            shop_name: "Subway Corrientes".to_string(),
            success: true,
            orders: 5,
            new_orders: 2,
            products: 11,
            sessions: 1,
            error: None,
        };

        let json = serde_json::to_value(&result).expect("result should serialize");
        assert!(json.get("error").is_none());
        assert_eq!(json["orders"], 5);
        assert_eq!(json["new_orders"], 2);
    }
}
