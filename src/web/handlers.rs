use super::templates::BrowserTemplate;
use crate::auth::SessionCredential;
use crate::error::GatewayError;
use crate::tracks::{Browser, FileGroup, Track};
use crate::AppState;
use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use axum::Json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Liveness probe - always returns OK if the process is running
pub async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Unknown paths; only reached with a valid session
pub async fn not_found_handler() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

/// `/` and `/index` both land on the browser page
pub async fn index_handler() -> Redirect {
    Redirect::permanent("/browser/")
}

fn flatten(listing: BTreeMap<String, Vec<FileGroup>>) -> Vec<FileGroup> {
    listing.into_values().flatten().collect()
}

pub async fn browser_handler(
    State(state): State<Arc<AppState>>,
    SessionCredential(credential): SessionCredential,
) -> Result<Html<String>, GatewayError> {
    let (bam_listing, signal_listing) = tokio::try_join!(
        state.assembler.alignment_list(&credential),
        state.assembler.signal_list(&credential),
    )?;

    let template = BrowserTemplate {
        reference_name: state.config.reference_name.clone(),
        bam_groups: flatten(bam_listing),
        signal_groups: flatten(signal_listing),
    };

    tracing::debug!(
        bam_groups = template.bam_groups.len(),
        signal_groups = template.signal_groups.len(),
        "Rendering browser page"
    );

    Ok(Html(template.render()?))
}

pub async fn default_track_handler(
    State(state): State<Arc<AppState>>,
    SessionCredential(credential): SessionCredential,
) -> Result<Json<Browser>, GatewayError> {
    let browser = state.assembler.default_track_config(&credential).await?;
    Ok(Json(browser))
}

pub async fn signal_tracks_handler(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    SessionCredential(credential): SessionCredential,
) -> Result<Json<Vec<Track>>, GatewayError> {
    let tracks = state.assembler.signal_tracks(&group_id, &credential).await?;
    tracing::debug!(group_id = %group_id, tracks = tracks.len(), "Signal tracks assembled");
    Ok(Json(tracks))
}

pub async fn alignment_tracks_handler(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    SessionCredential(credential): SessionCredential,
) -> Result<Json<Vec<Track>>, GatewayError> {
    let tracks = state
        .assembler
        .alignment_tracks(&group_id, &credential)
        .await?;
    tracing::debug!(group_id = %group_id, tracks = tracks.len(), "Alignment tracks assembled");
    Ok(Json(tracks))
}
