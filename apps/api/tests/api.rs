//! HTTP integration tests.
//!
//! Starts the full router on an ephemeral port over an in-memory database
//! and exercises it with reqwest.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use hisaab_api::{build_router, ApiConfig, AppState};
use hisaab_db::{Database, DbConfig};

struct TestApp {
    base: String,
    client: Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Registers `username` and returns a bearer token for it.
    async fn token_for(&self, username: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/register"))
            .json(&json!({ "username": username, "password": "secret123", "email": "a@b.in" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "username": username, "password": "secret123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await.unwrap();
        let status = resp.status();
        let text = resp.text().await.unwrap();
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }
}

async fn spawn_app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let mut config = ApiConfig::from_lookup(|_| None).unwrap();
    config.jwt_secret = "integration-test-secret".to_string();

    let app = build_router(AppState::new(db, config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        client: Client::new(),
    }
}

fn item_body(code: &str, sub_category: &str, quantity: i64, mrp: f64) -> Value {
    json!({
        "code": code,
        "hsn_code": "8482",
        "company_name": "SKF",
        "category": "Ball Bearing",
        "sub_category": sub_category,
        "quantity": quantity,
        "purchase_price": 30,
        "selling_price_mrp": mrp,
        "gst_rate": 18,
        "rack_no": "R1"
    })
}

fn sale_body(code: &str, quantity: i64) -> Value {
    json!({
        "date": "2024-03-05",
        "code": code,
        "hsn_code": "8482",
        "company_name": "SKF",
        "category": "Ball Bearing",
        "subcategory": "6201",
        "purchase_price": "30",
        "selling_price_mrp": "50",
        "quantity": quantity.to_string(),
        "discount": ""
    })
}

// =============================================================================
// Health, auth, CORS
// =============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/api/items")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, "/api/sales", "not-a-jwt", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token_for("asha").await;
    let (status, body) = app.send(Method::GET, "/api/items", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn register_and_login() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;
    assert!(!token.is_empty());

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "username": "asha", "password": "another1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Username already exists");

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": "asha", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid username or password");

    let (status, users) = app.send(Method::GET, "/api/users", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users[0]["username"], "asha");
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn user_update_checks_old_password() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users/1",
            &token,
            Some(json!({ "username": "asha", "email": "x@y.in", "password": "newpass1", "oldPassword": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Old password is incorrect");

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users/1",
            &token,
            Some(json!({ "username": "asha_k", "email": "x@y.in", "password": "newpass1", "oldPassword": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "asha_k");

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": "asha_k", "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users/99",
            &token,
            Some(json!({ "username": "ghost", "oldPassword": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = spawn_app().await;

    let resp = app
        .client
        .request(Method::OPTIONS, app.url("/api/items"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert!(resp.headers()["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .contains("Authorization"));
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn sale_lifecycle_keeps_stock_in_step() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    let (status, item) = app
        .send(Method::POST, "/api/items", &token, Some(item_body("SKF-6201", "6201", 100, 50.0)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_i64().unwrap();

    // Record
    let (status, body) = app
        .send(Method::POST, "/api/sales", &token, Some(sale_body("SKF-6201", 10)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "✅ Sale recorded and inventory updated");
    assert_eq!(body["updatedItem"]["quantity"], 90);
    assert_eq!(body["sale"]["total_amount"], 500.0);
    let sale_id = body["sale"]["id"].as_i64().unwrap();

    // Update: 10 → 4 puts 6 back
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/sales/{sale_id}"),
            &token,
            Some(sale_body("SKF-6201", 4)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "✅ Sale updated successfully");
    assert_eq!(body["sale"]["quantity"], 4);
    assert_eq!(body["sale"]["total_amount"], 200.0);

    let (_, items) = app.send(Method::GET, "/api/items", &token, None).await;
    assert_eq!(items[0]["id"], item_id);
    assert_eq!(items[0]["quantity"], 96);

    let (status, sale) = app
        .send(Method::GET, &format!("/api/sales/{sale_id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["date"], "2024-03-05");

    // Delete
    let (status, body) = app
        .send(Method::DELETE, &format!("/api/sales/{sale_id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "✅ Sale deleted successfully");
    assert_eq!(body["restoredQuantity"], 4);
    assert_eq!(body["itemCode"], "SKF-6201");

    let (_, items) = app.send(Method::GET, "/api/items", &token, None).await;
    assert_eq!(items[0]["quantity"], 100);

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/sales/{sale_id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Sale not found");

    let (status, _) = app
        .send(Method::PUT, "/api/sales/999", &token, Some(sale_body("SKF-6201", 1)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn record_sale_rejections_leave_nothing_behind() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;
    app.send(Method::POST, "/api/items", &token, Some(item_body("SKF-6201", "6201", 5, 50.0)))
        .await;

    // Missing company name
    let mut body = sale_body("SKF-6201", 1);
    body["company_name"] = json!("");
    let (status, _) = app.send(Method::POST, "/api/sales", &token, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing quantity
    let mut body = sale_body("SKF-6201", 1);
    body.as_object_mut().unwrap().remove("quantity");
    let (status, _) = app.send(Method::POST, "/api/sales", &token, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown item
    let (status, body) = app
        .send(Method::POST, "/api/sales", &token, Some(sale_body("NOPE", 1)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Failed to save sales entry.");
    assert_eq!(body["details"], "Item not found in inventory: NOPE");

    // Price too large to total
    let mut body = sale_body("SKF-6201", 2);
    body["selling_price_mrp"] = json!("900000000000000");
    let (status, body) = app.send(Method::POST, "/api/sales", &token, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        "selling_price_mrp must be between 0 and 1000000000"
    );

    // Oversell
    let (status, body) = app
        .send(Method::POST, "/api/sales", &token, Some(sale_body("SKF-6201", 6)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, sales) = app.send(Method::GET, "/api/sales", &token, None).await;
    assert_eq!(sales, json!([]));
    let (_, items) = app.send(Method::GET, "/api/items", &token, None).await;
    assert_eq!(items[0]["quantity"], 5);
}

// =============================================================================
// Items
// =============================================================================

#[tokio::test]
async fn item_identity_and_lifecycle() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    let (status, item) = app
        .send(Method::POST, "/api/items", &token, Some(item_body("A1", "6201", 10, 50.0)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut dup = item_body("A2", " 6201 ", 1, 50.0);
    dup["company_name"] = json!("skf");
    let (status, body) = app.send(Method::POST, "/api/items", &token, Some(dup)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Item already exists");

    let (status, _) = app
        .send(Method::POST, "/api/items", &token, Some(item_body("A1", "6202", 1, 50.0)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(Method::POST, "/api/items", &token, Some(item_body("A3", "6203", 1, 9.0e12)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "selling_price_mrp must be between 0 and 1000000000");

    let id = item["id"].as_i64().unwrap();
    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/items/{id}"),
            &token,
            Some(item_body("A1", "6201", 25, 55.5)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 25);
    assert_eq!(updated["selling_price_mrp"], 55.5);

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/items/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "✅ Item deleted successfully");

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/items/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item not found");
}

#[tokio::test]
async fn inventory_changes_are_streamed() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    let mut events = app.client.get(app.url("/api/events")).send().await.unwrap();
    assert_eq!(events.status(), StatusCode::OK);
    assert_eq!(events.headers()["content-type"], "text/event-stream");

    app.send(Method::POST, "/api/items", &token, Some(item_body("EV-1", "6201", 3, 50.0)))
        .await;

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut seen = String::new();
        while let Some(chunk) = events.chunk().await.unwrap() {
            seen.push_str(&String::from_utf8_lossy(&chunk));
            if seen.contains("\"action\":\"add\"") {
                break;
            }
        }
        seen
    })
    .await
    .unwrap();

    assert!(received.contains("\"type\":\"inventory\""));
    assert!(received.contains("EV-1"));
    assert!(!received.contains("purchase_price"));
}

// =============================================================================
// GST invoices
// =============================================================================

#[tokio::test]
async fn gst_invoice_is_priced_server_side() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;
    app.send(Method::POST, "/api/items", &token, Some(item_body("G1", "6201", 10, 118.0)))
        .await;

    let (status, product) = app
        .send(Method::GET, "/api/sales/gst-invoice/items/G1", &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["gst"], 18.0);
    assert_eq!(product["subcategory"], "6201");

    let (status, body) = app
        .send(Method::GET, "/api/sales/gst-invoice/items/NOPE", &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    let request = json!({
        "customer_details": { "name": "Ravi Traders", "address": "Main Road", "phone": "99999" },
        "items": [{ "code": "G1", "quantity": 2 }],
        "payment_mode": "Cash",
        "purchase_mode": "Counter"
    });
    let (status, body) = app
        .send(Method::POST, "/api/sales/gst-invoice", &token, Some(request))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert!(body["invoice_number"].as_str().unwrap().ends_with("-01"));
    assert_eq!(body["invoice"]["total_amount"], 236.0);

    let id = body["invoice_id"].as_i64().unwrap();
    let (status, invoice) = app
        .send(Method::GET, &format!("/api/sales/gst-invoice/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoice["items"][0]["description"], "SKF | Ball Bearing | 6201");
    assert_eq!(invoice["items"][0]["cgst"], 18.0);

    // Invoicing never moves stock
    let (_, items) = app.send(Method::GET, "/api/items", &token, None).await;
    assert_eq!(items[0]["quantity"], 10);
}

// =============================================================================
// Ledgers and cash credit
// =============================================================================

#[tokio::test]
async fn cash_flow_filters() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    for (date, direction) in [("2024-05-02", "in-flow"), ("2024-06-10", "out-flow")] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/cashflow",
                &token,
                Some(json!({ "category": "Rent", "subcategory": direction, "amount": 1500, "date": date })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, all) = app.send(Method::GET, "/api/cashflow", &token, None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["date"], "2024-06-10");

    let (_, day) = app
        .send(
            Method::GET,
            "/api/cashflow?filterType=single&customDate=2024-05-02",
            &token,
            None,
        )
        .await;
    assert_eq!(day.as_array().unwrap().len(), 1);

    let (_, month) = app
        .send(Method::GET, "/api/cashflow?filterType=month&month=6", &token, None)
        .await;
    assert_eq!(month[0]["subcategory"], "out-flow");

    let id = all[0]["id"].as_i64().unwrap();
    let (status, body) = app
        .send(Method::DELETE, &format!("/api/cashflow/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/cashflow/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profit_loss_entries() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    let (status, entry) = app
        .send(
            Method::POST,
            "/api/profit-loss",
            &token,
            Some(json!({ "month": "2024-05", "category": "Sales", "type": "Income", "amount": 9000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["type"], "Income");

    let (_, listed) = app
        .send(Method::GET, "/api/profit-loss?type=Expense", &token, None)
        .await;
    assert_eq!(listed, json!([]));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/profit-loss",
            &token,
            Some(json!({ "month": "May", "category": "Sales", "type": "Income", "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cash_credit_account() {
    let app = spawn_app().await;
    let token = app.token_for("asha").await;

    let (_, limit) = app.send(Method::GET, "/api/account-limit", &token, None).await;
    assert_eq!(limit["limit"], 1_000_000.0);

    let (status, limit) = app
        .send(Method::PUT, "/api/account-limit", &token, Some(json!({ "limit": 500000 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(limit["limit"], 500_000.0);

    let (status, txn) = app
        .send(
            Method::POST,
            "/api/transactions",
            &token,
            Some(json!({ "date": "2024-05-01", "type": "withdrawal", "amount": 2000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/transactions",
            &token,
            Some(json!({ "type": "withdrawal", "amount": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid transaction data");

    let (_, summary) = app
        .send(Method::GET, "/api/transactions/summary", &token, None)
        .await;
    assert_eq!(summary["withdrawals"], 2000.0);
    assert_eq!(summary["outstanding"], -2000.0);
    assert_eq!(summary["pendingDeposits"], 2000.0);
    assert_eq!(summary["available"], 498_000.0);

    let (status, calc) = app
        .send(
            Method::POST,
            "/api/calculations",
            &token,
            Some(json!({ "principal": 100000, "interest_rate": 12, "days": 30 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(calc["calculated_interest"], 986.3);

    let id = calc["id"].as_i64().unwrap();
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/calculations/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app
        .send(Method::DELETE, &format!("/api/calculations/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Calculation not found");

    let txn_id = txn["id"].as_i64().unwrap();
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/transactions/{txn_id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
