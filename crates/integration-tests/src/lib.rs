//! Integration tests for Poojabdi.
//!
//! The tests run the storefront and admin clients against [`MockShop`], an
//! in-process axum server that speaks the shop's HTTP surface:
//!
//! - `GET /products.json`
//! - `GET|POST|DELETE /api/cart` (per-session, keyed by a `session` cookie)
//! - `POST|PUT|DELETE /admin/api/product`
//! - `POST /admin/api/settings`
//! - `POST /api/update_product/{id}`
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p poojabdi-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::debug;
use url::Url;

use poojabdi_core::{Product, ProductId};

const SESSION_COOKIE: &str = "session";

/// A request the mock shop received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    CartAdd { id: i32, qty: i64 },
    CartDelete { id: i32 },
    ProductCreate,
    ProductUpdate { id: i32 },
    ProductDelete { id: i32 },
    Settings,
    InlineEdit { id: i32 },
}

#[derive(Debug, Default)]
struct ShopData {
    products: Vec<Product>,
    next_id: i32,
    carts: HashMap<String, BTreeMap<i32, i64>>,
    settings: BTreeMap<String, String>,
    log: Vec<Recorded>,
    reject_admin: bool,
    catalog_down: bool,
    cart_delete_latency: Duration,
}

/// Shared mock shop state.
#[derive(Debug, Clone, Default)]
pub struct ShopState {
    inner: Arc<Mutex<ShopData>>,
}

/// A running mock shop.
#[derive(Debug, Clone)]
pub struct MockShop {
    url: Url,
    state: ShopState,
}

impl MockShop {
    /// Start a shop on an ephemeral localhost port, seeded with `products`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(products: Vec<Product>) -> Self {
        let next_id = products.iter().map(|p| p.id.as_i32()).max().unwrap_or(0) + 1;
        let state = ShopState::default();
        {
            let mut data = state.inner.lock().await;
            data.products = products;
            data.next_id = next_id;
        }

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock shop listener");
        let addr = listener.local_addr().expect("mock shop address");
        let app = router(state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock shop stopped");
            }
        });

        let url = Url::parse(&format!("http://{addr}/")).expect("mock shop url");
        Self { url, state }
    }

    /// The shop origin.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Current catalog.
    pub async fn products(&self) -> Vec<Product> {
        self.state.inner.lock().await.products.clone()
    }

    /// Every session's cart, keyed by session id.
    pub async fn carts(&self) -> HashMap<String, BTreeMap<i32, i64>> {
        self.state.inner.lock().await.carts.clone()
    }

    /// Saved site settings.
    pub async fn settings(&self) -> BTreeMap<String, String> {
        self.state.inner.lock().await.settings.clone()
    }

    /// Requests received so far.
    pub async fn log(&self) -> Vec<Recorded> {
        self.state.inner.lock().await.log.clone()
    }

    /// Make every admin endpoint answer `{"ok": false}`.
    pub async fn reject_admin(&self, reject: bool) {
        self.state.inner.lock().await.reject_admin = reject;
    }

    /// Make `GET /products.json` answer 503 while `down` is set.
    pub async fn set_catalog_down(&self, down: bool) {
        self.state.inner.lock().await.catalog_down = down;
    }

    /// Delay cart DELETE handling, to widen race windows.
    pub async fn set_cart_delete_latency(&self, latency: Duration) {
        self.state.inner.lock().await.cart_delete_latency = latency;
    }

    /// Replace the catalog behind the clients' backs.
    pub async fn set_products(&self, products: Vec<Product>) {
        self.state.inner.lock().await.products = products;
    }
}

/// Catalog entry with a numeric `price_num`, as the shop serves it.
#[must_use]
pub fn product(id: i32, name_en: &str, price_num: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name_hi: String::new(),
        name_en: name_en.to_string(),
        price: format!("₹{price_num}"),
        price_num: Decimal::from(price_num),
        img: String::new(),
    }
}

fn router(state: ShopState) -> Router {
    Router::new()
        .route("/products.json", get(products_json))
        .route(
            "/api/cart",
            get(cart_get).post(cart_add).delete(cart_delete),
        )
        .route(
            "/admin/api/product",
            post(product_create)
                .put(product_update)
                .delete(product_delete),
        )
        .route("/admin/api/settings", post(settings_save))
        .route("/api/update_product/{id}", post(inline_edit))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// =============================================================================
// Catalog
// =============================================================================

async fn products_json(State(state): State<ShopState>) -> Response {
    let data = state.inner.lock().await;
    if data.catalog_down {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(data.products.iter().map(product_value).collect::<Vec<_>>()).into_response()
}

fn product_value(product: &Product) -> Value {
    // Serve the numeric price as a JSON number
    let price_num: Value =
        serde_json::from_str(&product.price_num.normalize().to_string()).unwrap_or(Value::Null);
    json!({
        "id": product.id.as_i32(),
        "name_hi": product.name_hi,
        "name_en": product.name_en,
        "price": product.price,
        "price_num": price_num,
        "img": product.img,
    })
}

// =============================================================================
// Session Cart
// =============================================================================

#[derive(Debug, Deserialize)]
struct CartAddBody {
    id: i32,
    #[serde(default = "one")]
    qty: i64,
}

const fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct IdBody {
    id: i32,
}

/// Session id from the cookie, minting one when absent.
fn session(headers: &HeaderMap) -> (String, HeaderMap) {
    let existing = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    let mut response_headers = HeaderMap::new();
    let id = existing.unwrap_or_else(|| {
        let id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&format!("{SESSION_COOKIE}={id}; Path=/")) {
            response_headers.insert(SET_COOKIE, value);
        }
        id
    });
    (id, response_headers)
}

fn cart_body(cart: Option<&BTreeMap<i32, i64>>) -> Value {
    let entries: serde_json::Map<String, Value> = cart
        .into_iter()
        .flatten()
        .map(|(id, qty)| (id.to_string(), json!(qty)))
        .collect();
    Value::Object(entries)
}

async fn cart_get(State(state): State<ShopState>, headers: HeaderMap) -> impl IntoResponse {
    let (session_id, set_cookie) = session(&headers);
    let data = state.inner.lock().await;
    (set_cookie, Json(cart_body(data.carts.get(&session_id))))
}

async fn cart_add(
    State(state): State<ShopState>,
    headers: HeaderMap,
    Json(body): Json<CartAddBody>,
) -> impl IntoResponse {
    let (session_id, set_cookie) = session(&headers);
    let mut data = state.inner.lock().await;
    data.log.push(Recorded::CartAdd {
        id: body.id,
        qty: body.qty,
    });
    let cart = data.carts.entry(session_id).or_default();
    *cart.entry(body.id).or_insert(0) += body.qty;
    debug!(id = body.id, qty = body.qty, "Cart add");
    (set_cookie, Json(cart_body(Some(cart))))
}

async fn cart_delete(
    State(state): State<ShopState>,
    headers: HeaderMap,
    Json(body): Json<IdBody>,
) -> impl IntoResponse {
    let (session_id, set_cookie) = session(&headers);
    let latency = {
        let mut data = state.inner.lock().await;
        data.log.push(Recorded::CartDelete { id: body.id });
        data.cart_delete_latency
    };
    // The entry is removed after the delay, like a slow backend would
    tokio::time::sleep(latency).await;

    let mut data = state.inner.lock().await;
    let cart = data.carts.entry(session_id).or_default();
    cart.remove(&body.id);
    (set_cookie, Json(cart_body(Some(cart))))
}

// =============================================================================
// Admin
// =============================================================================

async fn form_fields(mut multipart: Multipart) -> Result<BTreeMap<String, String>, Response> {
    let mut fields = BTreeMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(IntoResponse::into_response)?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn product_from_fields(id: i32, fields: &BTreeMap<String, String>) -> Product {
    let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
    Product {
        id: ProductId::new(id),
        name_hi: text("name_hi"),
        name_en: text("name_en"),
        price: text("price"),
        price_num: text("price_num").trim().parse().unwrap_or_default(),
        img: text("img"),
    }
}

fn ok(ok: bool) -> Json<Value> {
    Json(json!({ "ok": ok }))
}

async fn product_create(State(state): State<ShopState>, multipart: Multipart) -> Response {
    let fields = match form_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let mut data = state.inner.lock().await;
    data.log.push(Recorded::ProductCreate);
    if data.reject_admin {
        return ok(false).into_response();
    }
    let id = data.next_id;
    data.next_id += 1;
    data.products.push(product_from_fields(id, &fields));
    Json(json!({ "ok": true, "id": id })).into_response()
}

async fn product_update(State(state): State<ShopState>, multipart: Multipart) -> Response {
    let fields = match form_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let Some(id) = fields.get("id").and_then(|id| id.trim().parse::<i32>().ok()) else {
        return (StatusCode::BAD_REQUEST, ok(false)).into_response();
    };
    let mut data = state.inner.lock().await;
    data.log.push(Recorded::ProductUpdate { id });
    if data.reject_admin {
        return ok(false).into_response();
    }
    match data.products.iter_mut().find(|p| p.id.as_i32() == id) {
        Some(existing) => {
            *existing = product_from_fields(id, &fields);
            ok(true).into_response()
        }
        None => ok(false).into_response(),
    }
}

async fn product_delete(State(state): State<ShopState>, Json(body): Json<IdBody>) -> Json<Value> {
    let mut data = state.inner.lock().await;
    data.log.push(Recorded::ProductDelete { id: body.id });
    if data.reject_admin {
        return ok(false);
    }
    let before = data.products.len();
    data.products.retain(|p| p.id.as_i32() != body.id);
    ok(data.products.len() < before)
}

async fn settings_save(State(state): State<ShopState>, multipart: Multipart) -> Response {
    let fields = match form_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let mut data = state.inner.lock().await;
    data.log.push(Recorded::Settings);
    if data.reject_admin {
        return ok(false).into_response();
    }
    data.settings.extend(fields);
    ok(true).into_response()
}

#[derive(Debug, Deserialize)]
struct InlineEditBody {
    name: Option<String>,
    price: Option<String>,
}

async fn inline_edit(
    State(state): State<ShopState>,
    Path(id): Path<i32>,
    Form(body): Form<InlineEditBody>,
) -> Json<Value> {
    let mut data = state.inner.lock().await;
    data.log.push(Recorded::InlineEdit { id });
    let Some(product) = data.products.iter_mut().find(|p| p.id.as_i32() == id) else {
        return Json(json!({ "status": "not found" }));
    };
    if let Some(name) = body.name {
        product.name_en = name;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    Json(json!({ "status": "ok" }))
}
