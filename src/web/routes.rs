use super::handlers::{
    alignment_tracks_handler, browser_handler, default_track_handler, healthz_handler,
    index_handler, not_found_handler, signal_tracks_handler,
};
use crate::{
    auth::{authorize, callback_handler, login_handler},
    AppState,
};
use axum::{http::Method, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Everything here, unknown paths included, requires a session cookie
    let protected = Router::new()
        .route("/", get(index_handler))
        .route("/index", get(index_handler))
        .route("/browser", get(browser_handler))
        .route("/browser/", get(browser_handler))
        .route("/data/default", get(default_track_handler))
        .route("/data/bigWigsTrack/{id}", get(signal_tracks_handler))
        .route("/data/bamTrack/{id}", get(alignment_tracks_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), authorize));

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/login", get(login_handler))
        .route("/auth/callback", get(callback_handler))
        .merge(protected)
        .nest_service("/static", ServeDir::new("static"))
        .layer(cors_layer())
        .with_state(state)
}
