//! Projection from raw API records to persisted records.
//!
//! Pure functions with no failure mode: the serde layer already dropped
//! unknown fields, so projection only injects the shop identity and applies
//! timestamp normalization. Absent fields stay absent.

use tillsync_core::ShopConfig;

use crate::normalize::to_local_time;
use crate::types::{
    OrderRecord, ProductLineRecord, RawOrder, RawProductLine, RawSession, SessionRecord,
};

/// Shape one raw order for persistence under the given shop.
///
/// The shop code and name always come from the roster, never from the
/// payload, so a misconfigured POS account cannot mislabel rows.
#[must_use]
pub fn project_order(raw: RawOrder, shop: &ShopConfig) -> OrderRecord {
    OrderRecord {
        order_id: raw.id_sale_order,
        number: raw.number,
        total: raw.total,
        subtotal: raw.subtotal,
        discount: raw.discount,
        tax: raw.tax,
        tip: raw.tip,
        order_date: raw.order_date.map(|d| to_local_time(&d)),
        shop_code: shop.code.clone(),
        shop_name: shop.name.clone(),
        payment_method: raw.paymentmethod,
        status: raw.status,
        customer: raw.customer,
        notes: raw.notes,
        source: raw.source,
        channel: raw.channel,
        table_number: raw.table_number,
        order_type: raw.order_type,
    }
}

/// Shape one raw order line for persistence under the given shop.
#[must_use]
pub fn project_product_line(raw: RawProductLine, shop: &ShopConfig) -> ProductLineRecord {
    ProductLineRecord {
        order_id: raw.id_sale_order,
        product_id: raw.id_product,
        name: raw.name,
        fixed_name: raw.fixed_name,
        category: raw.category,
        quantity: raw.quantity,
        price: raw.price,
        total: raw.total,
        discount: raw.discount,
        notes: raw.notes,
        modifiers: raw.modifiers,
        shop_name: shop.name.clone(),
    }
}

/// Shape one raw register session for persistence under the given shop.
#[must_use]
pub fn project_session(raw: RawSession, shop: &ShopConfig) -> SessionRecord {
    SessionRecord {
        session_id: raw.id_session,
        shop_name: shop.name.clone(),
        date: raw.date.map(|d| to_local_time(&d)),
        opening_date: raw.opening_date.map(|d| to_local_time(&d)),
        closing_date: raw.closing_date.map(|d| to_local_time(&d)),
        cash: raw.cash,
        opening_cash: raw.opening_cash,
        closing_cash: raw.closing_cash,
        total_sales: raw.total_sales,
        total_cash: raw.total_cash,
        total_card: raw.total_card,
        total_other: raw.total_other,
        difference: raw.difference,
        status: raw.status,
        notes: raw.notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> ShopConfig {
        ShopConfig {
            key: "SC".to_string(),
            code: "66220".to_string(),
            name: "Subway Corrientes".to_string(),
            email: "66220@linisco.com.ar".to_string(),
        }
    }

    #[test]
    fn order_gets_shop_identity_from_roster() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({
            "idSaleOrder": "A-1",
            "total": 100.0,
            "shopName": "Whatever The Pos Claims",
            "shopNumber": "00000"
        }))
        .expect("order should deserialize");

        let record = project_order(raw, &shop());
        assert_eq!(record.shop_code, "66220");
        assert_eq!(record.shop_name, "Subway Corrientes");
    }

    #[test]
    fn order_date_is_normalized_to_local_time() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({
            "idSaleOrder": "A-2",
            "orderDate": "2025-01-15T14:30:00Z"
        }))
        .expect("order should deserialize");

        let record = project_order(raw, &shop());
        assert_eq!(record.order_date.as_deref(), Some("2025-01-15T11:30:00"));
    }

    #[test]
    fn absent_order_fields_stay_absent() {
        let raw: RawOrder =
            serde_json::from_value(serde_json::json!({"idSaleOrder": "A-3"})).unwrap();
        let record = project_order(raw, &shop());
        assert!(record.order_date.is_none());
        assert!(record.total.is_none());
        assert!(record.payment_method.is_none());
    }

    #[test]
    fn product_line_keeps_modifiers_blob() {
        let raw: RawProductLine = serde_json::from_value(serde_json::json!({
            "idSaleOrder": "A-1",
            "idProduct": 42,
            "name": "Cookie",
            "modifiers": [{"name": "sin gluten"}]
        }))
        .expect("line should deserialize");

        let record = project_product_line(raw, &shop());
        assert_eq!(record.product_id.as_deref(), Some("42"));
        assert!(record.modifiers.is_some());
        assert_eq!(record.shop_name, "Subway Corrientes");
    }

    #[test]
    fn session_dates_are_all_normalized() {
        let raw: RawSession = serde_json::from_value(serde_json::json!({
            "idSession": "S-9",
            "date": "2025-01-15T12:00:00Z",
            "openingDate": "2025-01-15T12:00:00Z",
            "closingDate": "not-a-date"
        }))
        .expect("session should deserialize");

        let record = project_session(raw, &shop());
        assert_eq!(record.date.as_deref(), Some("2025-01-15T09:00:00"));
        assert_eq!(record.opening_date.as_deref(), Some("2025-01-15T09:00:00"));
        // Unparseable closing date passes through untouched.
        assert_eq!(record.closing_date.as_deref(), Some("not-a-date"));
    }
}
