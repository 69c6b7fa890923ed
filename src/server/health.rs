// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::{Endpoint, EndpointExt, Route, Server};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi, OpenApiService};
use tracing::{error, info};

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> anyhow::Result<()>;
}

pub struct AlwaysHealthy;

#[async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Object)]
pub struct HealthStatus {
    hostname: String,
    healthy: bool,
    #[oai(skip_serializing_if_is_none)]
    error: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    message: Option<String>,
}

#[derive(ApiResponse)]
pub enum HealthResponse {
    #[oai(status = 200)]
    Healthy(Json<HealthStatus>),
    #[oai(status = 500)]
    Unhealthy(Json<HealthStatus>),
}

pub struct HealthApi {
    check: Arc<dyn HealthCheck>,
    hostname: String,
}

#[OpenApi]
impl HealthApi {
    pub fn new(check: Arc<dyn HealthCheck>, hostname: String) -> Self {
        Self { check, hostname }
    }

    #[oai(path = "/healthz", method = "get")]
    async fn healthz(&self) -> HealthResponse {
        match self.check.check().await {
            Ok(()) => HealthResponse::Healthy(Json(HealthStatus {
                hostname: self.hostname.clone(),
                healthy: true,
                error: None,
                message: None,
            })),
            Err(e) => {
                error!("error: {}", e);
                HealthResponse::Unhealthy(Json(HealthStatus {
                    hostname: self.hostname.clone(),
                    healthy: false,
                    error: Some(e.to_string()),
                    message: Some("problem detected".to_string()),
                }))
            }
        }
    }
}

pub fn app(check: Arc<dyn HealthCheck>, hostname: String) -> impl Endpoint {
    let api_service = OpenApiService::new(
        HealthApi::new(check, hostname),
        "Betterlog health",
        env!("CARGO_PKG_VERSION"),
    );
    Route::new().nest("/", api_service).with(Tracing)
}

/// Serves `/healthz` until `signal` resolves.
pub async fn start<F>(
    listen: &str,
    check: Arc<dyn HealthCheck>,
    hostname: String,
    signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Starting {}/healthz", listen);
    let listener = TcpListener::bind(listen.to_string());
    Server::new(listener)
        .run_with_graceful_shutdown(app(check, hostname), signal, Some(Duration::from_secs(5)))
        .await?;
    Ok(())
}
