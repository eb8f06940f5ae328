//! Raw and persisted record shapes for the three POS endpoints.
//!
//! The `Raw*` types double as the field allow-lists: serde drops any field
//! the POS sends that is not declared here, and fields the POS omits stay
//! `None`. The `*Record` types add the injected shop code/name and carry
//! normalized timestamps; they are what the storage layer persists.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Natural keys arrive as either JSON numbers or strings depending on the
/// POS firmware revision; store them uniformly as strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for identifier, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number for identifier, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Sale orders
// ---------------------------------------------------------------------------

/// One sale order as returned by `GET /sale_orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    #[serde(rename = "idSaleOrder", deserialize_with = "string_or_number")]
    pub id_sale_order: String,
    pub number: Option<i64>,
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub discount: Option<f64>,
    pub tax: Option<f64>,
    pub tip: Option<f64>,
    #[serde(rename = "orderDate")]
    pub order_date: Option<String>,
    pub paymentmethod: Option<String>,
    pub status: Option<String>,
    /// Free-form customer blob; some firmware sends a string, some an object.
    pub customer: Option<Value>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub channel: Option<String>,
    #[serde(rename = "tableNumber", default, deserialize_with = "opt_string_or_number")]
    pub table_number: Option<String>,
    #[serde(rename = "orderType")]
    pub order_type: Option<String>,
}

/// A sale order ready for persistence: projected fields plus the shop
/// identity, with `order_date` shifted to local time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub number: Option<i64>,
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub discount: Option<f64>,
    pub tax: Option<f64>,
    pub tip: Option<f64>,
    pub order_date: Option<String>,
    pub shop_code: String,
    pub shop_name: String,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub customer: Option<Value>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub channel: Option<String>,
    pub table_number: Option<String>,
    pub order_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Sale products (line items)
// ---------------------------------------------------------------------------

/// One order line as returned by `GET /sale_products`.
///
/// `idProduct` is absent from some payloads; when it is, the line can only be
/// deduplicated best-effort.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProductLine {
    #[serde(rename = "idSaleOrder", deserialize_with = "string_or_number")]
    pub id_sale_order: String,
    #[serde(rename = "idProduct", default, deserialize_with = "opt_string_or_number")]
    pub id_product: Option<String>,
    pub name: Option<String>,
    pub fixed_name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub total: Option<f64>,
    pub discount: Option<f64>,
    pub notes: Option<String>,
    pub modifiers: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductLineRecord {
    pub order_id: String,
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub fixed_name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub total: Option<f64>,
    pub discount: Option<f64>,
    pub notes: Option<String>,
    pub modifiers: Option<Value>,
    pub shop_name: String,
}

// ---------------------------------------------------------------------------
// Register sessions
// ---------------------------------------------------------------------------

/// One cash-register session as returned by `GET /psessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    #[serde(rename = "idSession", deserialize_with = "string_or_number")]
    pub id_session: String,
    pub date: Option<String>,
    #[serde(rename = "openingDate")]
    pub opening_date: Option<String>,
    #[serde(rename = "closingDate")]
    pub closing_date: Option<String>,
    pub cash: Option<f64>,
    #[serde(rename = "openingCash")]
    pub opening_cash: Option<f64>,
    #[serde(rename = "closingCash")]
    pub closing_cash: Option<f64>,
    #[serde(rename = "totalSales")]
    pub total_sales: Option<f64>,
    #[serde(rename = "totalCash")]
    pub total_cash: Option<f64>,
    #[serde(rename = "totalCard")]
    pub total_card: Option<f64>,
    #[serde(rename = "totalOther")]
    pub total_other: Option<f64>,
    pub difference: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_id: String,
    pub shop_name: String,
    pub date: Option<String>,
    pub opening_date: Option<String>,
    pub closing_date: Option<String>,
    pub cash: Option<f64>,
    pub opening_cash: Option<f64>,
    pub closing_cash: Option<f64>,
    pub total_sales: Option<f64>,
    pub total_cash: Option<f64>,
    pub total_card: Option<f64>,
    pub total_other: Option<f64>,
    pub difference: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_order_drops_fields_outside_the_allow_list() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({
            "idSaleOrder": "A-1001",
            "total": 1850.5,
            "orderDate": "2025-01-01T14:30:00Z",
            "internalAuditTrail": {"huge": "blob"},
            "posFirmware": "9.2.1"
        }))
        .expect("order should deserialize");

        assert_eq!(raw.id_sale_order, "A-1001");
        assert_eq!(raw.total, Some(1850.5));
        assert!(raw.subtotal.is_none());
        assert!(raw.paymentmethod.is_none());
    }

    #[test]
    fn numeric_natural_keys_become_strings() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({
            "idSaleOrder": 991_203,
            "tableNumber": 7
        }))
        .expect("order should deserialize");

        assert_eq!(raw.id_sale_order, "991203");
        assert_eq!(raw.table_number.as_deref(), Some("7"));
    }

    #[test]
    fn product_line_tolerates_missing_product_id() {
        let raw: RawProductLine = serde_json::from_value(serde_json::json!({
            "idSaleOrder": "A-1001",
            "name": "Sandwich 15cm",
            "quantity": 2,
            "price": 450.0
        }))
        .expect("line should deserialize");

        assert!(raw.id_product.is_none());
        assert_eq!(raw.quantity, Some(2.0));
    }

    #[test]
    fn session_parses_tender_breakdown() {
        let raw: RawSession = serde_json::from_value(serde_json::json!({
            "idSession": 55,
            "totalSales": 12000.0,
            "totalCash": 4000.0,
            "totalCard": 7500.0,
            "totalOther": 500.0,
            "difference": -12.5,
            "status": "closed"
        }))
        .expect("session should deserialize");

        assert_eq!(raw.id_session, "55");
        assert_eq!(raw.total_card, Some(7500.0));
        assert_eq!(raw.difference, Some(-12.5));
    }

    #[test]
    fn identifier_of_wrong_shape_is_rejected() {
        let result: Result<RawOrder, _> = serde_json::from_value(serde_json::json!({
            "idSaleOrder": {"nested": true}
        }));
        assert!(result.is_err());
    }
}
