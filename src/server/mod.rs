mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::host::NoteStore;
use crate::location::ReverseGeocoder;
pub use state::AppState;

pub fn build_router(store: NoteStore, geocoder: Arc<dyn ReverseGeocoder>, locale: String) -> Router {
    let state = Arc::new(AppState {
        store: Mutex::new(store),
        geocoder,
        locale,
    });

    Router::new()
        .route("/api/reverse", get(handlers::reverse))
        .route(
            "/api/notes/{id}/location",
            get(handlers::get_location)
                .put(handlers::put_location)
                .delete(handlers::delete_location),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(router: Router, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Location picker API listening on http://{}", addr);
    eprintln!("  Location picker API listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, router).await
}
