//! Black-box tests over the HTTP surface, running the real router on an
//! ephemeral port against the in-memory store.

use std::sync::Arc;

use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{Value, json};

use tienda_api::app::AppServices;
use tienda_api::config::ApiConfig;
use tienda_auth::{NewUser, Role, password};
use tienda_store::{MemStore, Store};

struct TestServer {
    base_url: String,
    store: Arc<MemStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = ApiConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            public_base_url: "http://shop.test".to_string(),
            session_ttl: Duration::minutes(10),
        };

        let store = Arc::new(MemStore::new());
        let services = Arc::new(AppServices::new(store.clone(), &config));
        let app = tienda_api::app::build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    /// Seed an admin account directly in the store (admin accounts are not
    /// creatable through the public registration endpoint).
    async fn seed_admin(&self, username: &str, pass: &str) {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{username}@shop.test"),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: password::hash_password(pass).unwrap(),
                role: Role::Admin,
            })
            .await
            .unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(client: &reqwest::Client, base: &str, username: &str) -> reqwest::Response {
    client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "s3creto",
        }))
        .send()
        .await
        .unwrap()
}

async fn login(client: &reqwest::Client, base: &str, identifier: &str, pass: &str) -> (StatusCode, Value) {
    let res = client
        .post(format!("{base}/login"))
        .json(&json!({ "identifier": identifier, "password": pass }))
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn create_product(
    client: &reqwest::Client,
    base: &str,
    token: &str,
    nombre: &str,
    precio: &str,
    stock: i64,
) -> (StatusCode, Value) {
    let form = reqwest::multipart::Form::new()
        .text("nombre", nombre.to_string())
        .text("descripcion", "desc")
        .text("tipo", "general")
        .text("precio", precio.to_string())
        .text("stock", stock.to_string())
        .text("condicion", "nuevo");

    let res = client
        .post(format!("{base}/products/create"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn place_order(
    client: &reqwest::Client,
    base: &str,
    usuario: &str,
    items: Value,
) -> (StatusCode, Value) {
    let res = client
        .post(format!("{base}/orders/create"))
        .json(&json!({ "usuario": usuario, "items": items }))
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn product_stock(client: &reqwest::Client, base: &str, id: i64) -> i64 {
    let products: Vec<Value> = client
        .get(format!("{base}/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    products
        .iter()
        .find(|p| p["id"] == json!(id))
        .expect("product present")["stock"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "ana").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = login(&client, &srv.base_url, "ana", "s3creto").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userType"], "user");
    assert_eq!(body["username"], "ana");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn login_accepts_email_as_identifier() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "ana").await;

    let (status, body) = login(&client, &srv.base_url, "ana@example.com", "s3creto").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ana");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "ana").await;

    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({
            "username": "ana",
            "email": "otra@example.com",
            "password": "otra",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().is_some());

    // The original account is untouched.
    let (status, _) = login(&client, &srv.base_url, "ana", "s3creto").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_are_rejected_uniformly() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "ana").await;

    let (status, body) = login(&client, &srv.base_url, "ana", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");

    let (status, body) = login(&client, &srv.base_url, "nadie", "s3creto").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn product_mutation_requires_an_admin_session() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // No token at all.
    let form = reqwest::multipart::Form::new().text("nombre", "x");
    let res = client
        .post(format!("{}/products/create", srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A customer token is not enough.
    register(&client, &srv.base_url, "ana").await;
    let (_, body) = login(&client, &srv.base_url, "ana", "s3creto").await;
    let customer_token = body["token"].as_str().unwrap().to_string();

    let form = reqwest::multipart::Form::new().text("nombre", "x");
    let res = client
        .post(format!("{}/products/create", srv.base_url))
        .bearer_auth(&customer_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_and_edits_products() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    assert_eq!(body["userType"], "admin");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, product) =
        create_product(&client, &srv.base_url, &token, "Teclado", "49.99", 5).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["nombre"], "Teclado");
    assert_eq!(product["precio"], "49.99");
    assert_eq!(product["stock"], 5);
    assert_eq!(product["imagen"], Value::Null);
    let id = product["id"].as_i64().unwrap();

    // Partial edit: only the price changes.
    let form = reqwest::multipart::Form::new().text("precio", "39.90");
    let res = client
        .post(format!("{}/products/edit/{id}", srv.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let edited: Value = res.json().await.unwrap();
    assert_eq!(edited["precio"], "39.90");
    assert_eq!(edited["nombre"], "Teclado");
    assert_eq!(edited["stock"], 5);
}

#[tokio::test]
async fn editing_an_unknown_product_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    let token = body["token"].as_str().unwrap().to_string();

    let form = reqwest::multipart::Form::new().text("precio", "1.00");
    let res = client
        .post(format!("{}/products/edit/9999", srv.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_computes_total_and_decrements_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    register(&client, &srv.base_url, "ana").await;

    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (_, product) =
        create_product(&client, &srv.base_url, &token, "Producto A", "10.00", 5).await;
    let id = product["id"].as_i64().unwrap();

    let (status, order) = place_order(
        &client,
        &srv.base_url,
        "ana",
        json!([{ "producto_id": id, "cantidad": 2 }]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["usuario"], "ana");
    assert_eq!(order["estado"], "pending");
    assert_eq!(order["total"], "20.00");
    assert_eq!(order["detalles"].as_array().unwrap().len(), 1);
    assert_eq!(order["detalles"][0]["producto"], "Producto A");
    assert_eq!(order["detalles"][0]["cantidad"], 2);
    assert_eq!(order["detalles"][0]["subtotal"], "20.00");
    assert!(order["fecha_pedido"].as_str().is_some());

    assert_eq!(product_stock(&client, &srv.base_url, id).await, 3);
}

#[tokio::test]
async fn order_with_unknown_product_persists_nothing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    register(&client, &srv.base_url, "ana").await;

    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (_, product) =
        create_product(&client, &srv.base_url, &token, "Producto A", "10.00", 5).await;
    let id = product["id"].as_i64().unwrap();

    let (status, body) = place_order(
        &client,
        &srv.base_url,
        "ana",
        json!([
            { "producto_id": id, "cantidad": 1 },
            { "producto_id": 9999, "cantidad": 1 },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());

    // Catalog and order history are unchanged.
    assert_eq!(product_stock(&client, &srv.base_url, id).await, 5);
    let orders: Vec<Value> = client
        .get(format!("{}/orders/user/ana", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn non_positive_quantity_is_invalid_input() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    register(&client, &srv.base_url, "ana").await;

    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (_, product) =
        create_product(&client, &srv.base_url, &token, "Producto A", "10.00", 5).await;
    let id = product["id"].as_i64().unwrap();

    let (status, _) = place_order(
        &client,
        &srv.base_url,
        "ana",
        json!([{ "producto_id": id, "cantidad": 0 }]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_quantity_is_rejected_before_persistence() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "ana").await;

    let res = client
        .post(format!("{}/orders/create", srv.base_url))
        .json(&json!({
            "usuario": "ana",
            "items": [{ "producto_id": 1, "cantidad": "dos" }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid request body");
}

#[tokio::test]
async fn ordering_for_an_unknown_user_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, _) = place_order(&client, &srv.base_url, "nadie", json!([])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/orders/user/nadie", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_are_listed_most_recent_first_with_numeric_totals() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    register(&client, &srv.base_url, "ana").await;

    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (_, product) =
        create_product(&client, &srv.base_url, &token, "Producto A", "10.00", 9).await;
    let id = product["id"].as_i64().unwrap();

    let mut created_ids = Vec::new();
    for qty in [1, 2, 3] {
        let (_, order) = place_order(
            &client,
            &srv.base_url,
            "ana",
            json!([{ "producto_id": id, "cantidad": qty }]),
        )
        .await;
        created_ids.push(order["id"].as_i64().unwrap());
    }

    let orders: Vec<Value> = client
        .get(format!("{}/orders/user/ana", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let listed_ids: Vec<i64> = orders.iter().map(|o| o["id"].as_i64().unwrap()).collect();
    created_ids.reverse();
    assert_eq!(listed_ids, created_ids);

    // The listing uses numeric totals and carries full line detail.
    assert!(orders[0]["total"].is_number());
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["items"][0]["productName"], "Producto A");
    assert_eq!(orders[0]["items"][0]["quantity"], 3);
    assert!(orders[0]["items"][0]["price"].is_number());
    assert!(orders[0]["items"][0]["subtotal"].is_number());
}

#[tokio::test]
async fn stock_exhaustion_is_a_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("jefa", "admin123").await;
    register(&client, &srv.base_url, "ana").await;

    let (_, body) = login(&client, &srv.base_url, "jefa", "admin123").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (_, product) =
        create_product(&client, &srv.base_url, &token, "Único", "99.00", 1).await;
    let id = product["id"].as_i64().unwrap();

    let (status, _) = place_order(
        &client,
        &srv.base_url,
        "ana",
        json!([{ "producto_id": id, "cantidad": 2 }]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(product_stock(&client, &srv.base_url, id).await, 1);
}

#[tokio::test]
async fn empty_order_is_permitted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "ana").await;

    let (status, order) = place_order(&client, &srv.base_url, "ana", json!([])).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], "0.00");
    assert!(order["detalles"].as_array().unwrap().is_empty());
}
