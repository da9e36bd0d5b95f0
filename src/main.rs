use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod database;
mod domain;
mod error;
mod handlers;
mod middleware;
mod services;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = crate::config::config();
    tracing::info!("Starting Helpdesk API in {:?} mode", config.environment);

    // Migrations and first-run seeding happen off the startup path: an
    // unreachable store leaves the server up with a degraded health check.
    tokio::spawn(async {
        if let Err(e) = crate::database::DatabaseManager::prepare().await {
            tracing::error!("Database initialization failed, deferring to first use: {}", e);
        }
    });

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("HELPDESK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Helpdesk API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server");
}

fn app() -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(admin_routes())
        .merge(organizational_routes())
        .merge(ticket_routes())
        .layer(axum::middleware::from_fn(middleware::jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/api/auth/login",
            axum::routing::post(handlers::public::auth::login),
        )
        // Protected API
        .merge(protected)
        // Global middleware; the rate limiter is outermost so it runs first
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config::config().api.max_request_size_bytes))
        .layer(axum::middleware::from_fn(middleware::rate_limit_middleware))
}

fn auth_routes() -> Router {
    use axum::routing::post;
    use handlers::protected::auth;

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
}

fn admin_routes() -> Router {
    use handlers::protected::admin;

    Router::new()
        .route(
            "/api/admin/users",
            get(admin::users_get).post(admin::users_post),
        )
        .route(
            "/api/admin/users/:id",
            axum::routing::put(admin::user_put).delete(admin::user_delete),
        )
}

fn organizational_routes() -> Router {
    use handlers::protected::organizational as org;

    Router::new()
        .route(
            "/api/organizational/organizations",
            get(org::organizations_get).post(org::organizations_post),
        )
        .route(
            "/api/organizational/organizations/:id",
            axum::routing::put(org::organization_put).delete(org::organization_delete),
        )
        .route(
            "/api/organizational/users",
            get(org::users_get).post(org::users_post),
        )
        .route(
            "/api/organizational/users/:id",
            axum::routing::delete(org::user_delete),
        )
}

fn ticket_routes() -> Router {
    use handlers::protected::tickets;

    Router::new()
        .route(
            "/api/tickets",
            get(tickets::tickets_get).post(tickets::tickets_post),
        )
        .route(
            "/api/tickets/:id",
            get(tickets::ticket_get)
                .put(tickets::ticket_put)
                .delete(tickets::ticket_delete),
        )
        .route(
            "/api/tickets/:id/notes",
            get(tickets::notes_get).post(tickets::notes_post),
        )
        .route(
            "/api/tickets/:id/attachments",
            get(tickets::attachments_get).post(tickets::attachments_post),
        )
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;

    if config::config().environment == config::Environment::Development
        || security.cors_origins.is_empty()
    {
        return CorsLayer::permissive();
    }

    let origins: Vec<axum::http::HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Helpdesk API",
            "version": version,
            "description": "Student support ticketing backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/api/auth/login (public - token acquisition)",
                "auth": "/api/auth/me, /api/auth/logout (protected)",
                "admin": "/api/admin/users[/:id] (protected - organization scoped)",
                "organizational": "/api/organizational/organizations[/:id], /api/organizational/users[/:id] (protected - supreme admin)",
                "tickets": "/api/tickets[/:id], /api/tickets/:id/notes, /api/tickets/:id/attachments (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "message": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
