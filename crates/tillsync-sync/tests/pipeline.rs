//! Fault-isolation tests for the shop pipeline and the run loop, against a
//! wiremock POS and a migrated test database.

use sqlx::PgPool;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tillsync_core::{AppConfig, DateWindow, Environment, ShopConfig, ShopsFile, SyncMode};
use tillsync_pos::PosClient;
use tillsync_sync::{run_sync, sync_shop, SyncRequest};

fn shop(key: &str, code: &str) -> ShopConfig {
    ShopConfig {
        key: key.to_string(),
        code: code.to_string(),
        name: format!("Shop {key}"),
        email: format!("{code}@linisco.com.ar"),
    }
}

fn window() -> DateWindow {
    DateWindow {
        from_date: "01/01/2025".to_string(),
        to_date: "02/01/2025".to_string(),
    }
}

fn app_config(pos_base_url: &str) -> AppConfig {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    AppConfig {
        database_url: "postgres://unused-in-tests".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        shops_path: PathBuf::from("./config/shops.yaml"),
        pos_base_url: pos_base_url.to_string(),
        pos_timeout_secs: 30,
        lookback_hours: 24,
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 5,
    }
}

async fn mount_sign_in_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "authentication_token": "tok-abc123"
        })))
        .mount(server)
        .await;
}

async fn mount_fetch(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn one_session() -> serde_json::Value {
    serde_json::json!([{
        "idSession": "S-55",
        "openingDate": "2025-01-01T08:00:00Z",
        "closingDate": "2025-01-01T22:00:00Z",
        "totalSales": 12000.0,
        "status": "closed"
    }])
}

fn one_order() -> serde_json::Value {
    serde_json::json!([{
        "idSaleOrder": "A-1",
        "number": 17,
        "total": 1850.5,
        "orderDate": "2025-01-01T14:30:00Z",
        "paymentmethod": "cash"
    }])
}

async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count query should succeed")
}

/// An order endpoint outage must not stop the session fetch for the same
/// shop: orders come back zeroed with an error note while the sessions are
/// still fetched and persisted.
#[sqlx::test(migrations = "../../migrations")]
async fn order_endpoint_outage_still_syncs_sessions(pool: PgPool) {
    let server = MockServer::start().await;
    mount_sign_in_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/sale_orders"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_fetch(&server, "/sale_products", serde_json::json!([])).await;
    mount_fetch(&server, "/psessions", one_session()).await;

    let shop = shop("KA", "70001");
    std::env::set_var(
        shop.credential_env_var(),
        r#"{"user":{"email":"70001@linisco.com.ar","password":"pw"}}"#,
    );

    let client = PosClient::new(&server.uri(), 30).expect("client construction should not fail");
    let result = sync_shop(&pool, &client, &shop, &window(), SyncMode::Manual).await;

    assert!(result.success, "a single broken endpoint must not fail the shop");
    assert_eq!(result.orders, 0);
    assert_eq!(result.new_orders, 0);
    assert_eq!(result.sessions, 1);
    let error = result.error.expect("the order outage should be reported");
    assert!(error.contains("order fetch failed"), "got: {error}");

    assert_eq!(count_rows(&pool, "register_sessions").await, 1);
}

/// An order write failure is contained the same way a fetch failure is:
/// the order counts come back zero and the other kinds still persist.
#[sqlx::test(migrations = "../../migrations")]
async fn order_write_failure_still_syncs_other_kinds(pool: PgPool) {
    let server = MockServer::start().await;
    mount_sign_in_ok(&server).await;
    mount_fetch(&server, "/sale_orders", one_order()).await;
    mount_fetch(&server, "/sale_products", serde_json::json!([])).await;
    mount_fetch(&server, "/psessions", one_session()).await;

    // Break the order table out from under the upsert.
    sqlx::query("ALTER TABLE sale_orders RENAME COLUMN payment_method TO payment_method_x")
        .execute(&pool)
        .await
        .expect("schema change should succeed");

    let shop = shop("KB", "70002");
    std::env::set_var(
        shop.credential_env_var(),
        r#"{"user":{"email":"70002@linisco.com.ar","password":"pw"}}"#,
    );

    let client = PosClient::new(&server.uri(), 30).expect("client construction should not fail");
    let result = sync_shop(&pool, &client, &shop, &window(), SyncMode::Manual).await;

    assert!(result.success);
    assert_eq!(result.orders, 0);
    assert_eq!(result.new_orders, 0);
    assert_eq!(result.sessions, 1);
    let error = result.error.expect("the order write failure should be reported");
    assert!(error.contains("order upsert failed"), "got: {error}");

    assert_eq!(count_rows(&pool, "register_sessions").await, 1);
}

/// One shop failing to sign in must not touch the other shop's sync: the
/// run still completes, the healthy shop's records land, and the summary
/// reports the split.
#[sqlx::test(migrations = "../../migrations")]
async fn failed_sign_in_is_contained_to_its_shop(pool: PgPool) {
    let server = MockServer::start().await;

    let bad_credential = r#"{"user":{"email":"70003@linisco.com.ar","password":"stale"}}"#;
    let good_credential = r#"{"user":{"email":"70004@linisco.com.ar","password":"pw"}}"#;

    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .and(body_string(bad_credential))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .and(body_string(good_credential))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "authentication_token": "tok-abc123"
        })))
        .mount(&server)
        .await;
    mount_fetch(&server, "/sale_orders", one_order()).await;
    mount_fetch(&server, "/sale_products", serde_json::json!([])).await;
    mount_fetch(&server, "/psessions", serde_json::json!([])).await;

    let locked_out = shop("KC", "70003");
    let healthy = shop("KD", "70004");
    std::env::set_var(locked_out.credential_env_var(), bad_credential);
    std::env::set_var(healthy.credential_env_var(), good_credential);

    let roster = ShopsFile {
        shops: vec![locked_out, healthy],
    };
    let config = app_config(&server.uri());
    let request = SyncRequest {
        mode: None,
        from_date: Some("01/01/2025".to_string()),
        to_date: Some("02/01/2025".to_string()),
        shops: None,
    };

    let summary = run_sync(&pool, &config, &roster, &request)
        .await
        .expect("the run itself should succeed");

    assert!(summary.success);
    assert_eq!(summary.shop_results.len(), 2);

    let failed = &summary.shop_results[0];
    assert!(!failed.success);
    assert!(
        failed.error.as_deref().is_some_and(|e| e.contains("sign-in failed")),
        "got: {:?}",
        failed.error
    );
    assert_eq!(failed.orders, 0);

    let synced = &summary.shop_results[1];
    assert!(synced.success);
    assert_eq!(synced.orders, 1);
    assert_eq!(synced.new_orders, 1);
    assert!(synced.error.is_none());

    assert_eq!(summary.orders, 1);
    assert_eq!(summary.message, "synced 1/2 shops (1 failed), 1 new orders");
    assert_eq!(count_rows(&pool, "sale_orders").await, 1);
}
