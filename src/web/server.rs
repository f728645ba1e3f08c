use crate::web::{handlers, AppState};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/deals", get(handlers::deals))
        .route("/average_year", get(handlers::average_year))
        .route("/average_month", get(handlers::average_month))
        .route("/average_month/:year", get(handlers::average_month_for))
        .route("/customer_value", get(handlers::customer_value))
        .route("/customer_value/:year", get(handlers::customer_value_for))
        .route("/customers", get(handlers::customers))
        .route("/customer/:id", get(handlers::customer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the listener and serves the dashboard until the process stops.
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, router(state)).await
}
