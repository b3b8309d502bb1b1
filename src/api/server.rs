//! HTTP server assembly.

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::api::server_config::*;
use crate::collaborator::http::HttpCollaborator;
use crate::core::config::ServiceConfig;
use crate::core::errors::MultisigError;
use crate::engine::MultisigEngine;
use crate::storage::MultisigStorage;

pub struct MultisigServer {
    pub engine: MultisigEngine,
    pub host: String,
    pub port: u16,
}

impl MultisigServer {
    pub async fn new(config: ServiceConfig) -> Result<Self, MultisigError> {
        let storage = Arc::new(MultisigStorage::new(&config.storage).await?);
        let collaborator = Arc::new(HttpCollaborator::new(&config.collaborator)?);
        let engine = MultisigEngine::new(storage, collaborator);
        Ok(Self {
            engine,
            host: config.server.host,
            port: config.server.port,
        })
    }

    /// Constructor for tests: wraps an already-built engine, typically one
    /// backed by in-memory storage and a mock collaborator.
    pub fn with_engine(engine: MultisigEngine) -> Self {
        Self {
            engine,
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    pub fn create_router(self) -> Router {
        let state = Arc::new(self);

        let base_router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/companies", post(handlers::accounts::create_company))
            .route(
                "/companies/:company_id/members",
                post(handlers::accounts::create_team_member),
            )
            .route(
                "/companies/:company_id/accounts",
                get(handlers::accounts::list_company_accounts),
            )
            .route(
                "/companies/:company_id/proposals",
                get(handlers::proposals::list_company_proposals),
            )
            .route("/accounts/:account_id", get(handlers::accounts::get_account))
            .route(
                "/accounts/:account_id/members",
                get(handlers::accounts::list_account_members),
            )
            .route(
                "/accounts/:account_id/proposals",
                get(handlers::proposals::list_account_proposals),
            )
            .route("/proposals/:proposal_id", get(handlers::proposals::get_proposal))
            .route(
                "/proposals/:proposal_id/signatures",
                post(handlers::proposals::submit_signature)
                    .get(handlers::proposals::list_signatures),
            )
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(|err: BoxError| async move {
                        if err.is::<tower::timeout::error::Elapsed>() {
                            (StatusCode::REQUEST_TIMEOUT, "request timed out")
                        } else {
                            (StatusCode::SERVICE_UNAVAILABLE, "service overloaded")
                        }
                    }))
                    .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                    .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                    .layer(TraceLayer::new_for_http()),
            );

        // Routes that call out to the execution collaborator get a longer
        // timeout; proof generation is slow.
        let collaborator_router = Router::new()
            .route("/accounts", post(handlers::accounts::create_account))
            .route(
                "/accounts/:account_id/notes",
                get(handlers::accounts::get_account_notes),
            )
            .route(
                "/accounts/:account_id/balances",
                get(handlers::accounts::get_account_balances),
            )
            .route(
                "/proposals/consume",
                post(handlers::proposals::create_consume_proposal),
            )
            .route(
                "/proposals/send",
                post(handlers::proposals::create_send_proposal),
            )
            .route(
                "/proposals/send-batch",
                post(handlers::proposals::create_batch_send_proposal),
            )
            .route(
                "/proposals/:proposal_id/execute",
                post(handlers::proposals::execute_proposal),
            )
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(|err: BoxError| async move {
                        if err.is::<tower::timeout::error::Elapsed>() {
                            (StatusCode::REQUEST_TIMEOUT, "request timed out")
                        } else {
                            (StatusCode::SERVICE_UNAVAILABLE, "service overloaded")
                        }
                    }))
                    .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                    .layer(TimeoutLayer::new(COLLABORATOR_REQUEST_TIMEOUT))
                    .layer(TraceLayer::new_for_http()),
            );

        base_router
            .merge(collaborator_router)
            .with_state(state)
            .layer(CorsLayer::permissive().max_age(CORS_MAX_AGE))
    }

    pub async fn start(self) -> Result<(), anyhow::Error> {
        let addr = format!("{}:{}", self.host, self.port);
        let app = self.create_router();
        tracing::info!("Server listening on {}", addr);
        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
