//! HTTP server: router assembly and startup.

mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::storage::Backend;

pub fn build_router(backend: Backend) -> Router {
    let state = Arc::new(AppState { backend });

    Router::new()
        .route("/", get(handlers::index))
        .route("/addSchool", post(handlers::add_school))
        .route("/listSchools", get(handlers::list_schools))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, backend: Backend) {
    let app = build_router(backend);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  School Atlas listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
