//! Genome browser gateway library
//!
//! Authenticates users against an OAuth2 identity provider and serves igv.js
//! configuration built from the remote data catalog.

#![deny(dead_code)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod tracks;
pub mod web;

use auth::SessionManager;
use config::Config;
use std::sync::Arc;
use tracks::TrackAssembler;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<SessionManager>,
    pub assembler: TrackAssembler,
}
