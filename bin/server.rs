// Price Tracker - Web Server
// HTML form surface plus a small read-only JSON API

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use price_tracker::{
    list_markets, list_products, list_recent_prices, open_database, register_market,
    register_price, register_product, Config, PriceObservation, RegistryError,
    DEFAULT_RECENT_LIMIT,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Flash message carried across the POST-redirect-GET hop
#[derive(Deserialize)]
struct FlashParams {
    flash: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct MarketForm {
    name: String,
}

#[derive(Deserialize)]
struct ProductForm {
    name: String,
    #[serde(default)]
    brand: String,
}

// Ids arrive as raw strings so a malformed select value becomes a flash
// message instead of a 422 from the extractor.
#[derive(Deserialize)]
struct PriceForm {
    product_id: String,
    market_id: String,
    amount: String,
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

// ============================================================================
// HTML Handlers
// ============================================================================

/// GET / - Dashboard with the most recent price observations
async fn dashboard(State(state): State<AppState>, Query(flash): Query<FlashParams>) -> Response {
    let conn = state.db.lock().unwrap();

    match list_recent_prices(&conn, DEFAULT_RECENT_LIMIT) {
        Ok(recent) => {
            let mut body = String::from("<h2>Recent prices</h2>");
            if recent.is_empty() {
                body.push_str("<p>No prices recorded yet.</p>");
            } else {
                body.push_str(
                    "<table><tr><th>Product</th><th>Brand</th>\
                     <th>Market</th><th>Amount</th><th>Recorded</th></tr>",
                );
                for obs in &recent {
                    body.push_str(&format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td>\
                         <td>{:.2}</td><td>{}</td></tr>",
                        escape(&obs.product_name),
                        escape(obs.brand.as_deref().unwrap_or("-")),
                        escape(&obs.market_name),
                        obs.amount,
                        obs.recorded_at.format("%Y-%m-%d %H:%M"),
                    ));
                }
                body.push_str("</table>");
            }
            page("Dashboard", &flash, &body).into_response()
        }
        Err(e) => storage_failure("loading dashboard", &e),
    }
}

/// GET /markets - Market list with registration form
async fn markets_page(State(state): State<AppState>, Query(flash): Query<FlashParams>) -> Response {
    let conn = state.db.lock().unwrap();

    match list_markets(&conn) {
        Ok(markets) => {
            let mut body = String::from("<h2>Markets</h2><ul>");
            for market in &markets {
                body.push_str(&format!("<li>{}</li>", escape(&market.name)));
            }
            body.push_str(
                "</ul><form method=\"post\" action=\"/markets\">\
                 <input name=\"name\" placeholder=\"Market name\">\
                 <button type=\"submit\">Add market</button></form>",
            );
            page("Markets", &flash, &body).into_response()
        }
        Err(e) => storage_failure("listing markets", &e),
    }
}

/// POST /markets - Register a market, redirect back to the list
async fn create_market(State(state): State<AppState>, Form(form): Form<MarketForm>) -> Response {
    let conn = state.db.lock().unwrap();

    match register_market(&conn, &form.name) {
        Ok(market) => {
            tracing::info!(id = market.id, name = %market.name, "market registered");
            redirect_with_flash("/markets", &format!("Market '{}' registered", market.name))
        }
        Err(e) if e.is_recoverable() => {
            tracing::warn!("market registration rejected: {}", e);
            redirect_with_error("/markets", &e.to_string())
        }
        Err(e) => storage_failure("registering market", &e),
    }
}

/// GET /products - Product list with registration form
async fn products_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let conn = state.db.lock().unwrap();

    match list_products(&conn) {
        Ok(products) => {
            let mut body = String::from("<h2>Products</h2><ul>");
            for product in &products {
                match &product.brand {
                    Some(brand) => body.push_str(&format!(
                        "<li>{} ({})</li>",
                        escape(&product.name),
                        escape(brand)
                    )),
                    None => body.push_str(&format!("<li>{}</li>", escape(&product.name))),
                }
            }
            body.push_str(
                "</ul><form method=\"post\" action=\"/products\">\
                 <input name=\"name\" placeholder=\"Product name\">\
                 <input name=\"brand\" placeholder=\"Brand (optional)\">\
                 <button type=\"submit\">Add product</button></form>",
            );
            page("Products", &flash, &body).into_response()
        }
        Err(e) => storage_failure("listing products", &e),
    }
}

/// POST /products - Register a product, redirect back to the list
async fn create_product(State(state): State<AppState>, Form(form): Form<ProductForm>) -> Response {
    let conn = state.db.lock().unwrap();
    let brand = if form.brand.trim().is_empty() {
        None
    } else {
        Some(form.brand.as_str())
    };

    match register_product(&conn, &form.name, brand) {
        Ok(product) => {
            tracing::info!(id = product.id, name = %product.name, "product registered");
            redirect_with_flash(
                "/products",
                &format!("Product '{}' registered", product.name),
            )
        }
        Err(e) if e.is_recoverable() => {
            tracing::warn!("product registration rejected: {}", e);
            redirect_with_error("/products", &e.to_string())
        }
        Err(e) => storage_failure("registering product", &e),
    }
}

/// GET /prices/new - Price form with product and market select lists
async fn price_form(State(state): State<AppState>, Query(flash): Query<FlashParams>) -> Response {
    let conn = state.db.lock().unwrap();

    let (products, markets) = match (list_products(&conn), list_markets(&conn)) {
        (Ok(p), Ok(m)) => (p, m),
        (Err(e), _) | (_, Err(e)) => return storage_failure("loading price form", &e),
    };

    if products.is_empty() || markets.is_empty() {
        let body = "<h2>Record a price</h2>\
                    <p>Register at least one product and one market first.</p>";
        return page("New price", &flash, body).into_response();
    }

    let mut body = String::from(
        "<h2>Record a price</h2>\
         <form method=\"post\" action=\"/prices/new\">\
         <select name=\"product_id\">",
    );
    for product in &products {
        body.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            product.id,
            escape(&product.name)
        ));
    }
    body.push_str("</select><select name=\"market_id\">");
    for market in &markets {
        body.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            market.id,
            escape(&market.name)
        ));
    }
    body.push_str(
        "</select>\
         <input name=\"amount\" placeholder=\"Amount\">\
         <button type=\"submit\">Record price</button></form>",
    );
    page("New price", &flash, &body).into_response()
}

/// POST /prices/new - Record a price, redirect to the dashboard
async fn create_price(State(state): State<AppState>, Form(form): Form<PriceForm>) -> Response {
    let (Ok(product_id), Ok(market_id)) =
        (form.product_id.parse::<i64>(), form.market_id.parse::<i64>())
    else {
        return redirect_with_error("/prices/new", "product and market ids must be integers");
    };

    let conn = state.db.lock().unwrap();

    match register_price(&conn, product_id, market_id, &form.amount) {
        Ok(price) => {
            tracing::info!(id = price.id, amount = price.amount, "price recorded");
            Redirect::to("/").into_response()
        }
        Err(e) if e.is_recoverable() => {
            tracing::warn!("price registration rejected: {}", e);
            redirect_with_error("/prices/new", &e.to_string())
        }
        Err(e) => storage_failure("recording price", &e),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/prices - Recent observations as JSON
async fn api_recent_prices(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Response {
    let conn = state.db.lock().unwrap();
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);

    match list_recent_prices(&conn, limit) {
        Ok(prices) => (StatusCode::OK, Json(ApiResponse::ok(prices))).into_response(),
        Err(e) => {
            tracing::error!("error listing prices: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<PriceObservation>::new())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Views
// ============================================================================

fn page(title: &str, flash: &FlashParams, body: &str) -> Html<String> {
    let mut notices = String::new();
    if let Some(msg) = &flash.flash {
        notices.push_str(&format!("<p class=\"flash\">{}</p>", escape(msg)));
    }
    if let Some(msg) = &flash.error {
        notices.push_str(&format!("<p class=\"error\">{}</p>", escape(msg)));
    }

    Html(format!(
        "<!DOCTYPE html><html><head><title>{title} - Price Tracker</title></head><body>\
         <nav><a href=\"/\">Dashboard</a> | <a href=\"/products\">Products</a> | \
         <a href=\"/markets\">Markets</a> | <a href=\"/prices/new\">New price</a></nav>\
         {notices}{body}</body></html>"
    ))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn redirect_with_flash(path: &str, message: &str) -> Response {
    Redirect::to(&format!("{}?flash={}", path, urlencoding::encode(message))).into_response()
}

fn redirect_with_error(path: &str, message: &str) -> Response {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(message))).into_response()
}

fn storage_failure(context: &str, err: &RegistryError) -> Response {
    tracing::error!("error {}: {}", context, err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    // Schema creation is idempotent, so every startup runs it
    let conn = open_database(&config.db_path)?;
    tracing::info!(path = ?config.db_path, "database ready");

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/prices", get(api_recent_prices));

    let app = Router::new()
        .route("/", get(dashboard))
        .route("/markets", get(markets_page).post(create_market))
        .route("/products", get(products_page).post(create_product))
        .route("/prices/new", get(price_form).post(create_price))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
