//! HTTP server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::transactions: Ledger page, entry form, list and JSON endpoints
//! - routes::settings: Configuration display

pub mod error;
pub mod routes;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
    routing::{delete, get, post},
    Json, Router,
};
use pennyweb_config::Config;
use pennyweb_core::{Ledger, LedgerOperations, LedgerSummary};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub config: Config,
}

impl AppState {
    pub fn new(ledger: Ledger, config: Config) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            config,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::settings::{api_settings, page_settings};
    use routes::transactions::{
        api_transaction_create, api_transaction_delete, api_transaction_detail, api_transactions,
        htmx_ledger, htmx_transaction_delete, htmx_transaction_store, page_ledger,
    };

    let api = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/summary", get(api_summary))
        .route("/api/transactions", get(api_transactions).post(api_transaction_create))
        .route(
            "/api/transactions/:id",
            get(api_transaction_detail).delete(api_transaction_delete),
        )
        .route("/api/settings", get(api_settings))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    Router::new()
        // HTMX page routes
        .route("/", get(page_ledger))
        .route("/settings", get(page_settings))
        // HTMX partial routes
        .route("/ledger", get(htmx_ledger))
        .route("/transactions", post(htmx_transaction_store))
        .route("/transactions/:id", delete(htmx_transaction_delete))
        .merge(api)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Get ledger summary (JSON API)
async fn api_summary(State(state): State<AppState>) -> Json<LedgerSummary> {
    let ledger = state.ledger.read().await;
    Json(ledger.summary())
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Pennyweb</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .income {{ color: #059669; }}
        .expense {{ color: #dc2626; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        title, content
    )
}

/// Navigation sidebar
pub fn nav_sidebar(current_path: &str) -> String {
    let links = [("/", "Ledger"), ("/settings", "Settings")];

    let mut nav = String::from("<div class='bg-white border-r h-screen flex flex-col'><div class='p-4 border-b'><h1 class='text-xl font-bold text-indigo-600'>Pennyweb</h1></div><ul class='flex-1 py-2 space-y-1 px-2'>");

    for (path, label) in &links {
        let is_active = if *path == "/" {
            current_path == "/"
        } else {
            current_path.starts_with(path)
        };
        let active_class = if is_active {
            "bg-indigo-50 text-indigo-600"
        } else {
            "text-gray-600 hover:bg-gray-50"
        };
        nav.push_str(&format!(
            r#"<li><a href='{}' class='flex items-center gap-2 px-3 py-2 rounded-lg {}'><span>{}</span></a></li>"#,
            path, active_class, label
        ));
    }
    nav.push_str("</ul></div>");
    nav
}

/// True when the request was issued by HTMX
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true")
        .unwrap_or(false)
}

/// Wrap content for a full page, or return just the main area for HTMX
pub fn page_response(headers: &HeaderMap, title: &str, current_path: &str, inner_content: &str) -> Html<String> {
    if is_htmx_request(headers) {
        Html(format!(
            r#"<main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>"#,
            inner_content
        ))
    } else {
        Html(base_html(
            title,
            &format!(
                r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <aside class='w-64 flex-shrink-0'>{}</aside>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
                nav_sidebar(current_path),
                inner_content
            ),
        ))
    }
}

/// Start the HTTP server and serve until Ctrl-C
pub async fn start_server(config: Config, ledger: Ledger) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(ledger, config);

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting Pennyweb server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Ledger)");
    log::info!("  - /settings (Configuration)");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pennyweb_core::{KeyValueStore, MemoryStore};
    use tower::ServiceExt;

    fn test_app() -> (Router, MemoryStore) {
        let config = Config::default();
        let store = MemoryStore::new();
        let ledger = Ledger::new(&config, Box::new(store.clone()));
        (create_router(AppState::new(ledger, config)), store)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("HX-Request", "true")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete_req(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let (status, body) = send(&app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_create_and_summarize() {
        let (app, store) = test_app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": "Salary", "amount": 1000.0, "type": "income"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["description"], "Salary");
        assert_eq!(created["type"], "income");

        send(
            &app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": "Rent", "amount": 400.0, "type": "expense"}),
            ),
        )
        .await;

        let (_, body) = send(&app, get("/api/summary")).await;
        let summary: LedgerSummary = serde_json::from_str(&body).unwrap();
        assert_eq!(summary.balance, 600.0);
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expense, 400.0);
        assert_eq!(summary.total_transactions, 2);

        assert_eq!(store.get_item("balance").unwrap().as_deref(), Some("600"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let (app, store) = test_app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": "  ", "amount": 10.0, "type": "expense"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please enter a description"));

        let (status, body) = send(
            &app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": "Lunch", "amount": 10.0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please select a transaction type"));

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let (app, _) = test_app();
        let (_, body) = send(
            &app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": "Coffee", "amount": 3.5, "type": "expense"}),
            ),
        )
        .await;
        let id = serde_json::from_str::<serde_json::Value>(&body).unwrap()["id"]
            .as_u64()
            .unwrap();

        let (status, body) = send(&app, delete_req(&format!("/api/transactions/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"removed":true}"#);

        let (_, body) = send(&app, delete_req(&format!("/api/transactions/{}", id))).await;
        assert_eq!(body, r#"{"removed":false}"#);

        let (status, _) = send(&app, get(&format!("/api/transactions/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_form_store_renders_fragment() {
        let (app, _) = test_app();

        let (status, body) = send(
            &app,
            post_form("/transactions", "description=Salary+%26+bonus&amount=1000&type=income"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Salary &amp; bonus"));
        assert!(body.contains("$1,000.00"));

        let (_, body) = send(&app, get("/api/transactions")).await;
        let list: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list["total_count"], 1);
    }

    #[tokio::test]
    async fn test_form_store_validation_message() {
        let (app, store) = test_app();
        let (status, body) = send(
            &app,
            post_form("/transactions", "description=Lunch&amount=abc&type=expense"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please enter a valid amount"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_index_escapes_descriptions() {
        let (app, _) = test_app();
        send(
            &app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": "<script>x</script>", "amount": 1.0, "type": "expense"}),
            ),
        )
        .await;

        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!body.contains("<script>x</script>"));
        assert!(body.contains("-$1.00"));
    }

    #[tokio::test]
    async fn test_settings_json() {
        let (app, _) = test_app();
        let (status, body) = send(&app, get("/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        let settings: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(settings["server"]["port"], 8081);
    }

    async fn create(app: &Router, description: &str, amount: f64, kind: &str) -> u64 {
        let (_, body) = send(
            app,
            post_json(
                "/api/transactions",
                serde_json::json!({"description": description, "amount": amount, "type": kind}),
            ),
        )
        .await;
        serde_json::from_str::<serde_json::Value>(&body).unwrap()["id"]
            .as_u64()
            .unwrap()
    }

    #[tokio::test]
    async fn test_transactions_type_filter() {
        let (app, _) = test_app();
        create(&app, "Salary", 1000.0, "income").await;
        create(&app, "Rent", 400.0, "expense").await;
        create(&app, "Coffee", 3.5, "expense").await;

        let (status, body) = send(&app, get("/api/transactions?type=expense")).await;
        assert_eq!(status, StatusCode::OK);
        let list: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list["total_count"], 2);
        assert!(list["transactions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["type"] == "expense"));

        let (_, body) = send(&app, get("/api/transactions?type=income")).await;
        let list: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list["total_count"], 1);
        assert_eq!(list["transactions"][0]["description"], "Salary");

        let (_, body) = send(&app, get("/api/transactions")).await;
        let list: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list["total_count"], 3);
    }

    #[tokio::test]
    async fn test_htmx_delete_rerenders_fragment() {
        let (app, store) = test_app();
        create(&app, "Salary", 1000.0, "income").await;
        let rent = create(&app, "Rent", 400.0, "expense").await;

        let (status, body) = send(&app, delete_req(&format!("/transactions/{}", rent))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Salary"));
        assert!(!body.contains("Rent"));
        assert!(!body.contains(&format!("/transactions/{}'", rent)));
        assert!(body.contains("<p id='balance' class='text-2xl font-bold'>$1,000.00</p>"));
        assert_eq!(store.get_item("totalExpense").unwrap().as_deref(), Some("0"));

        // unknown ids leave the fragment as it was
        let (status, again) = send(&app, delete_req(&format!("/transactions/{}", rent))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again, body);
    }

    #[tokio::test]
    async fn test_settings_page() {
        let (app, _) = test_app();
        let (status, body) = send(&app, get("/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("./data/ledger.json"));
        assert!(body.contains("$999,999,999.99"));
    }
}
