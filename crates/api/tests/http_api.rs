use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use storekeep_api::app::{build_app_with_services, services};
use storekeep_api::config::AppConfig;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Build the prod router over in-memory stores, bound to an ephemeral port.
    async fn spawn() -> Self {
        let config = AppConfig::for_tests("test-secret");
        let services = Arc::new(services::build_services(&config).await.unwrap());

        // Seed accounts the way the admin CLI would.
        services
            .authenticator
            .register("root", "root-password", true)
            .await
            .unwrap();
        services
            .authenticator
            .register("kasia", "kasia-password", false)
            .await
            .unwrap();

        let app = build_app_with_services(&config, services).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(client: &reqwest::Client, srv: &TestServer, username: &str, password: &str) -> String {
    let res = client
        .post(srv.url("/auth/token"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

fn employee_payload(id: &str, role: &str) -> serde_json::Value {
    json!({
        "id": id,
        "surname": "Shevchenko",
        "name": "Petro",
        "patronymic": null,
        "role": role,
        "salary": 18000.0,
        "date_of_birth": "2000-05-15",
        "date_of_start": "2024-06-01",
        "phone": "+380456789012",
        "city": "Kyiv",
        "street": "Khreshchatyk",
        "zip_code": "01001"
    })
}

#[tokio::test]
async fn health_is_public_and_everything_else_is_not() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/categories")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/token"))
        .json(&json!({ "username": "root", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn superuser_bypasses_permission_checks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "root", "root-password").await;

    let res = client
        .post(srv.url("/categories"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Dairy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(srv.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "root");
    assert_eq!(body["is_superuser"], true);
}

#[tokio::test]
async fn cashier_permissions_follow_the_role_table() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let root = login(&client, &srv, "root", "root-password").await;

    // Hire a cashier and link the account to them.
    let res = client
        .post(srv.url("/employees"))
        .bearer_auth(&root)
        .json(&employee_payload("0000000001", "cashier"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(srv.url("/admin/users/2/employee"))
        .bearer_auth(&root)
        .json(&json!({ "employee_id": "0000000001" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let cashier = login(&client, &srv, "kasia", "kasia-password").await;

    // Cashiers may view categories but not create them.
    let res = client
        .get(srv.url("/categories"))
        .bearer_auth(&cashier)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/categories"))
        .bearer_auth(&cashier)
        .json(&json!({ "name": "Bakery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The employee list is off limits, but the linked record is visible
    // through the self-view permission.
    let res = client
        .get(srv.url("/employees"))
        .bearer_auth(&cashier)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/employees/me"))
        .bearer_auth(&cashier)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], "0000000001");

    // Admin surface requires the superuser flag.
    let res = client
        .post(srv.url("/admin/permissions/sync"))
        .bearer_auth(&cashier)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn employee_with_unknown_role_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let root = login(&client, &srv, "root", "root-password").await;

    let res = client
        .post(srv.url("/employees"))
        .bearer_auth(&root)
        .json(&employee_payload("0000000001", "driver"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was created.
    let res = client
        .get(srv.url("/employees/0000000001"))
        .bearer_auth(&root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_prices_lines_applies_discount_and_decrements_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let root = login(&client, &srv, "root", "root-password").await;

    // Catalog setup: category → product → shelf item with stock 5 at 100.00.
    let res = client
        .post(srv.url("/categories"))
        .bearer_auth(&root)
        .json(&json!({ "name": "Dairy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: serde_json::Value = res.json().await.unwrap();

    let res = client
        .post(srv.url("/products"))
        .bearer_auth(&root)
        .json(&json!({
            "category": category["number"],
            "name": "Milk",
            "characteristics": "1l"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product: serde_json::Value = res.json().await.unwrap();

    let res = client
        .post(srv.url("/store-products"))
        .bearer_auth(&root)
        .json(&json!({
            "upc": "036000291452",
            "promotional_upc": null,
            "product_id": product["id"],
            "selling_price": 100.0,
            "quantity": 5,
            "promotional": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Loyalty card with a 10% discount.
    let res = client
        .post(srv.url("/customer-cards"))
        .bearer_auth(&root)
        .json(&json!({
            "card_number": "1234567890123",
            "surname": "Kovalenko",
            "name": "Olena",
            "patronymic": null,
            "phone": "+380456789012",
            "city": null,
            "street": null,
            "zip_code": null,
            "percent": 10
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(srv.url("/employees"))
        .bearer_auth(&root)
        .json(&employee_payload("0000000001", "cashier"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Two units at 100.00 minus 10%, plus 20% VAT on the discounted total.
    let res = client
        .post(srv.url("/checks"))
        .bearer_auth(&root)
        .json(&json!({
            "number": "1010101010",
            "employee_id": "0000000001",
            "card_number": "1234567890123",
            "printed_at": chrono::Utc::now(),
            "sales": [{ "upc": "036000291452", "quantity": 2 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let check: serde_json::Value = res.json().await.unwrap();
    assert!((check["total"].as_f64().unwrap() - 180.0).abs() < 1e-9);
    assert!((check["vat"].as_f64().unwrap() - 36.0).abs() < 1e-9);
    assert_eq!(check["sales"][0]["selling_price"].as_f64().unwrap(), 100.0);

    // Stock went down.
    let res = client
        .get(srv.url("/store-products/036000291452"))
        .bearer_auth(&root)
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["quantity"], 3);

    // Overselling the remaining stock is rejected.
    let res = client
        .post(srv.url("/checks"))
        .bearer_auth(&root)
        .json(&json!({
            "number": "1010101011",
            "employee_id": "0000000001",
            "card_number": null,
            "printed_at": chrono::Utc::now(),
            "sales": [{ "upc": "036000291452", "quantity": 10 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn employee_role_change_moves_linked_user_between_groups() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let root = login(&client, &srv, "root", "root-password").await;

    let res = client
        .post(srv.url("/employees"))
        .bearer_auth(&root)
        .json(&employee_payload("0000000001", "cashier"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(srv.url("/admin/users/2/employee"))
        .bearer_auth(&root)
        .json(&json!({ "employee_id": "0000000001" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // As a cashier, creating categories is forbidden.
    let cashier = login(&client, &srv, "kasia", "kasia-password").await;
    let res = client
        .post(srv.url("/categories"))
        .bearer_auth(&cashier)
        .json(&json!({ "name": "Bakery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Promote the employee to manager; the linked user's groups follow.
    let res = client
        .put(srv.url("/employees/0000000001"))
        .bearer_auth(&root)
        .json(&employee_payload("0000000001", "manager"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/categories"))
        .bearer_auth(&cashier)
        .json(&json!({ "name": "Bakery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}
