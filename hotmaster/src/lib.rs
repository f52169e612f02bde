//! hotmaster library interface
//!
//! Exposes the router, services and engine for the binary and for
//! integration tests.

pub mod api;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use hotmaster_common::config::DataFolders;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::{EngineConfig, MasteringEngine};
use crate::services::{JobOrchestrator, PreviewExtractor, VariantPipeline, VotingEngine};
use crate::storage::StorageLayout;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: JobOrchestrator,
    pub voting: VotingEngine,
    pub layout: StorageLayout,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<dyn MasteringEngine>, config: EngineConfig, folders: DataFolders) -> Self {
        Self::with_voting(engine, config, folders, VotingEngine::new())
    }

    /// Same as [`AppState::new`] with a caller-supplied voting engine
    /// (seeded in tests)
    pub fn with_voting(
        engine: Arc<dyn MasteringEngine>,
        config: EngineConfig,
        folders: DataFolders,
        voting: VotingEngine,
    ) -> Self {
        let layout = StorageLayout::new(folders);
        let pipeline = VariantPipeline::new(engine.clone(), config.clone(), layout.clone());
        let extractor = PreviewExtractor::new(engine, config, layout.clone());

        Self {
            orchestrator: JobOrchestrator::new(voting.clone(), pipeline, extractor),
            voting,
            layout,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::job_routes())
        .merge(api::media_routes())
        .merge(api::voting_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
