//! End-to-end HTTP tests against the axum router and an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower::ServiceExt;

use gstease_api::config::{PricingMode, StockPolicy};
use gstease_api::{build_router, AppConfig, AppState};
use gstease_core::{GstRate, Money, Product};
use gstease_db::{Database, DbConfig, NewCustomer, NewProduct};
use gstease_notify::{Dispatcher, DispatcherHandle, RecordingNotifier};

struct TestApp {
    router: Router,
    db: Database,
    handle: DispatcherHandle,
    dispatcher: JoinHandle<()>,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    async fn start() -> Self {
        Self::with_config(test_config()).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, handle) = Dispatcher::new(notifier.clone(), config.dispatcher_config());
        let dispatcher = tokio::spawn(dispatcher.run());

        let router = build_router(AppState::new(db.clone(), handle.clone(), &config));
        TestApp {
            router,
            db,
            handle,
            dispatcher,
            notifier,
        }
    }

    async fn product(&self, name: &str, rupees: i64, rate_bps: u32, stock: i64, threshold: i64) -> Product {
        self.db
            .products()
            .insert(
                &NewProduct::new(name, Money::from_rupees(rupees), GstRate::from_bps(rate_bps))
                    .hsn_code("8471")
                    .opening_stock(stock)
                    .low_stock_threshold(threshold),
            )
            .await
            .unwrap()
    }

    async fn stock_of(&self, product_id: &str) -> i64 {
        self.db.stock().current_stock(product_id).await.unwrap()
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body.to_string())).await
    }

    async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body.to_string())).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Stops the dispatcher after it has drained the queue.
    async fn drain_notifications(self) -> Arc<RecordingNotifier> {
        self.handle.shutdown().await.unwrap();
        self.dispatcher.await.unwrap();
        self.notifier
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig {
        company_name: "Test Traders".to_string(),
        admin_email: Some("admin@test.example".to_string()),
        ..AppConfig::default()
    };
    config.notify.max_retry_secs = 1;
    config
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

// =============================================================================
// Invoice creation
// =============================================================================

#[tokio::test]
async fn test_create_invoice_computes_totals_and_deducts_stock() {
    let app = TestApp::start().await;
    let widget = app.product("Widget", 100, 1800, 5, 1).await;

    let (status, body) = app
        .post(
            "/invoices",
            json!({
                "gstType": "cgst_sgst",
                "items": [{ "productId": widget.id, "quantity": 2, "gstAmount": "1.00", "totalAmount": "1.00" }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["invoiceNumber"], "INV-000001");
    assert_eq!(body["invoiceType"], "b2c");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["subtotal"], "200.00");
    assert_eq!(body["cgstAmount"], "18.00");
    assert_eq!(body["sgstAmount"], "18.00");
    assert_eq!(body["igstAmount"], "0.00");
    assert_eq!(body["totalGst"], "36.00");
    assert_eq!(body["roundOff"], "0.00");
    assert_eq!(body["totalAmount"], "236.00");
    assert!(body.get("warnings").is_none());

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["productName"], "Widget");
    assert_eq!(items[0]["hsnCode"], "8471");
    assert_eq!(items[0]["gstRate"], "18.00");
    assert_eq!(items[0]["gstAmount"], "36.00");
    assert_eq!(items[0]["totalAmount"], "236.00");

    assert_eq!(app.stock_of(&widget.id).await, 3);

    let (status, body) = app.get(&format!("/products/{}/stock-history", widget.id)).await;
    assert_eq!(status, StatusCode::OK);
    let sale = body
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["changeType"] == "sale")
        .unwrap();
    assert_eq!(sale["quantityChange"], -2);
    assert_eq!(sale["balanceAfter"], 3);
    assert_eq!(sale["referenceType"], "invoice");
}

#[tokio::test]
async fn test_igst_invoice_with_free_text_line() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post(
            "/invoices",
            json!({
                "gstType": "igst",
                "invoiceType": "b2b",
                "items": [{ "productName": "Installation", "quantity": 1, "price": "1000", "gstRate": 18 }],
                "notes": "  Net 30  "
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["invoiceType"], "b2b");
    assert_eq!(body["cgstAmount"], "0.00");
    assert_eq!(body["igstAmount"], "180.00");
    assert_eq!(body["totalAmount"], "1180.00");
    assert_eq!(body["notes"], "Net 30");
    assert!(body["items"][0]["productId"].is_null());
}

#[tokio::test]
async fn test_odd_gst_split_shows_round_off() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post(
            "/invoices",
            json!({
                "gstType": "cgst_sgst",
                "items": [{ "productName": "Envelope", "quantity": 1, "price": "1", "gstRate": 5 }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["subtotal"], "1.00");
    assert_eq!(body["cgstAmount"], "0.03");
    assert_eq!(body["sgstAmount"], "0.03");
    assert_eq!(body["totalGst"], "0.05");
    assert_eq!(body["roundOff"], "0.01");
    assert_eq!(body["totalAmount"], "1.06");
    assert_eq!(body["items"][0]["totalAmount"], "1.05");

    // Stored, not recomputed on read
    let id = body["id"].as_str().unwrap();
    let (_, fetched) = app.get(&format!("/invoices/{id}")).await;
    assert_eq!(fetched["roundOff"], "0.01");
    assert_eq!(fetched["totalAmount"], "1.06");
}

#[tokio::test]
async fn test_invoice_numbers_are_sequential() {
    let app = TestApp::start().await;
    let line = json!([{ "productName": "Service", "quantity": 1, "price": 10, "gstRate": 0 }]);

    for expected in ["INV-000001", "INV-000002", "INV-000003"] {
        let (status, body) = app
            .post("/invoices", json!({ "gstType": "igst", "items": line }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["invoiceNumber"], expected);
    }

    let (_, body) = app.get("/invoices").await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["invoiceNumber"], "INV-000003");
    assert!(body[0].get("items").is_none());

    let (_, body) = app.get("/invoices/recent?limit=2").await;
    let numbers: Vec<_> = body.as_array().unwrap().iter().map(|i| i["invoiceNumber"].clone()).collect();
    assert_eq!(numbers, vec![json!("INV-000003"), json!("INV-000002")]);
}

#[tokio::test]
async fn test_best_effort_shortfall_becomes_warning() {
    let app = TestApp::start().await;
    let widget = app.product("Widget", 50, 1200, 1, 0).await;

    let (status, body) = app
        .post(
            "/invoices",
            json!({ "gstType": "cgst_sgst", "items": [{ "productId": widget.id, "quantity": 3 }] }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains("Widget"));

    // Invoice stands, stock untouched
    assert_eq!(app.stock_of(&widget.id).await, 1);
    let (_, list) = app.get("/invoices").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_strict_shortfall_rejects_invoice() {
    let config = AppConfig {
        stock_policy: StockPolicy::Strict,
        ..test_config()
    };
    let app = TestApp::with_config(config).await;
    let widget = app.product("Widget", 50, 1200, 1, 0).await;

    let (status, body) = app
        .post(
            "/invoices",
            json!({ "gstType": "cgst_sgst", "items": [{ "productId": widget.id, "quantity": 3 }] }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(app.stock_of(&widget.id).await, 1);

    let (_, list) = app.get("/invoices").await;
    assert!(list.as_array().unwrap().is_empty());

    // The failed attempt did not burn a number
    let (status, body) = app
        .post(
            "/invoices",
            json!({ "gstType": "cgst_sgst", "items": [{ "productId": widget.id, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invoiceNumber"], "INV-000001");
    assert_eq!(app.stock_of(&widget.id).await, 0);
}

#[tokio::test]
async fn test_catalog_pricing_ignores_stale_submitted_values() {
    let stale = |product_id: &str| {
        json!({
            "gstType": "cgst_sgst",
            "items": [{ "productId": product_id, "quantity": 2, "price": "50", "gstRate": 5 }]
        })
    };

    let config = AppConfig {
        pricing: PricingMode::Catalog,
        ..test_config()
    };
    let app = TestApp::with_config(config).await;
    let widget = app.product("Widget", 100, 1800, 5, 1).await;

    let (status, body) = app.post("/invoices", stale(&widget.id)).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let line = &body["items"][0];
    assert_eq!(line["price"], "100.00");
    assert_eq!(line["gstRate"], "18.00");
    assert_eq!(line["gstAmount"], "36.00");
    assert_eq!(line["totalAmount"], "236.00");
    assert_eq!(body["subtotal"], "200.00");
    assert_eq!(body["totalGst"], "36.00");
    assert_eq!(body["totalAmount"], "236.00");

    // Same draft under the default mode keeps what the client sent
    let app = TestApp::start().await;
    let widget = app.product("Widget", 100, 1800, 5, 1).await;

    let (status, body) = app.post("/invoices", stale(&widget.id)).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["items"][0]["price"], "50.00");
    assert_eq!(body["items"][0]["gstRate"], "5.00");
    assert_eq!(body["subtotal"], "100.00");
    assert_eq!(body["totalAmount"], "105.00");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_rejects_invalid_drafts() {
    let app = TestApp::start().await;

    let cases = [
        json!({ "gstType": "igst", "items": [] }),
        json!({ "gstType": "igst", "items": [{ "productId": "missing", "quantity": 1 }] }),
        json!({ "gstType": "igst", "items": [{ "productName": "Labour", "quantity": 1, "gstRate": 18 }] }),
        json!({ "gstType": "igst", "items": [{ "productName": "Labour", "quantity": 0, "price": 1, "gstRate": 18 }] }),
        json!({ "gstType": "igst", "items": [{ "productName": "Labour", "quantity": 1, "price": "1.001", "gstRate": 18 }] }),
        json!({ "gstType": "igst", "items": [{ "productName": "Labour", "quantity": 1, "price": 1, "gstRate": 101 }] }),
        json!({ "gstType": "igst", "customerId": "ghost", "items": [{ "productName": "Labour", "quantity": 1, "price": 1, "gstRate": 5 }] }),
        json!({ "gstType": "vat", "items": [{ "productName": "Labour", "quantity": 1, "price": 1, "gstRate": 5 }] }),
    ];

    for case in cases {
        let (status, body) = app.post("/invoices", case.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case} -> {body}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (_, list) = app.get("/invoices").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let app = TestApp::start().await;

    let (status, body) = app
        .send(Method::POST, "/invoices", Some("{ not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Reads and status
// =============================================================================

#[tokio::test]
async fn test_unknown_invoice_is_not_found() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/invoices/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app
        .patch("/invoices/does-not-exist/status", json!({ "status": "paid" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_status() {
    let app = TestApp::start().await;
    let (_, created) = app
        .post(
            "/invoices",
            json!({ "gstType": "igst", "items": [{ "productName": "Audit", "quantity": 1, "price": 500, "gstRate": 18 }] }),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .patch(&format!("/invoices/{}/status", id), json!({ "status": "paid" }))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = app.get(&format!("/invoices/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    // Totals never change after creation
    assert_eq!(body["totalAmount"], "590.00");

    let (status, body) = app
        .patch(&format!("/invoices/{}/status", id), json!({ "status": "cancelled" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_stock_add_and_adjust() {
    let app = TestApp::start().await;
    let widget = app.product("Widget", 10, 500, 5, 2).await;

    let (status, body) = app
        .post(
            &format!("/products/{}/stock/add", widget.id),
            json!({ "quantity": 10, "referenceId": "PO-17" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["changeType"], "purchase");
    assert_eq!(body["balanceAfter"], 15);
    assert_eq!(body["lowStock"], false);

    let (status, body) = app
        .post(
            &format!("/products/{}/stock/adjust", widget.id),
            json!({ "delta": -20, "reason": "Damaged" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_ADJUSTMENT");

    let (status, body) = app
        .post(
            &format!("/products/{}/stock/adjust", widget.id),
            json!({ "delta": -13, "reason": "Stock count" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balanceAfter"], 2);
    assert_eq!(body["lowStock"], true);

    let (status, body) = app
        .post(
            &format!("/products/{}/stock/add", widget.id),
            json!({ "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, history) = app.get(&format!("/products/{}/stock-history", widget.id)).await;
    let entries = history.as_array().unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last["changeType"], "adjustment");
    assert_eq!(last["notes"], "Stock count");
    assert_eq!(last["balanceAfter"], 2);

    let (_, low) = app.get("/products/low-stock").await;
    assert_eq!(low[0]["name"], "Widget");
    assert_eq!(low[0]["price"], "10.00");

    let (_, suggestions) = app.get("/inventory/reorder-suggestions").await;
    assert_eq!(suggestions[0]["suggestedQuantity"], 4);
}

#[tokio::test]
async fn test_stock_operations_on_unknown_product() {
    let app = TestApp::start().await;

    let (status, _) = app.get("/products/ghost/stock-history").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/products/ghost/stock/add", json!({ "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_dashboard_stats() {
    let app = TestApp::start().await;
    let widget = app.product("Widget", 100, 1800, 5, 4).await;
    app.db
        .customers()
        .insert(&NewCustomer::new("Asha"))
        .await
        .unwrap();

    let (_, body) = app.get("/dashboard/stats").await;
    assert_eq!(body["totalRevenue"], "0.00");
    assert_eq!(body["totalInvoices"], 0);

    app.post(
        "/invoices",
        json!({ "gstType": "cgst_sgst", "items": [{ "productId": widget.id, "quantity": 2 }] }),
    )
    .await;

    let (status, body) = app.get("/dashboard/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalRevenue"], "236.00");
    assert_eq!(body["totalInvoices"], 1);
    assert_eq!(body["pendingInvoices"], 1);
    assert_eq!(body["totalProducts"], 1);
    assert_eq!(body["totalCustomers"], 1);
    assert_eq!(body["lowStockProducts"], 1);
    assert_eq!(body["todayRevenue"], "236.00");
    assert_eq!(body["todayInvoices"], 1);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_invoice_and_low_stock_emails() {
    let app = TestApp::start().await;
    let widget = app.product("Widget", 100, 1800, 5, 3).await;
    let customer = app
        .db
        .customers()
        .insert(&NewCustomer::new("Asha").email("asha@example.com"))
        .await
        .unwrap();

    let (status, _) = app
        .post(
            "/invoices",
            json!({
                "customerId": customer.id,
                "gstType": "cgst_sgst",
                "items": [{ "productId": widget.id, "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let notifier = app.drain_notifications().await;
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);

    let invoice_mail = sent.iter().find(|m| m.to == "asha@example.com").unwrap();
    assert_eq!(invoice_mail.subject, "Invoice INV-000001 from Test Traders");

    let alert = sent.iter().find(|m| m.to == "admin@test.example").unwrap();
    assert_eq!(alert.subject, "Low Stock Alert - Widget");
    assert!(alert.body_text.contains("Current Stock: 3"));
}

#[tokio::test]
async fn test_customer_without_email_gets_no_mail() {
    let app = TestApp::start().await;
    let customer = app
        .db
        .customers()
        .insert(&NewCustomer::new("Walk-in"))
        .await
        .unwrap();

    let (status, _) = app
        .post(
            "/invoices",
            json!({
                "customerId": customer.id,
                "gstType": "igst",
                "items": [{ "productName": "Repair", "quantity": 1, "price": 250, "gstRate": 18 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let notifier = app.drain_notifications().await;
    assert!(notifier.sent().is_empty());
}
