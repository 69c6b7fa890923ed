// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use poem::http::StatusCode;
use poem::web::Data;
use poem::{handler, Body, IntoResponse, Response};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Where relayed log bodies end up.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn write(&self, data: &[u8]) -> io::Result<()>;
}

/// Relays to the process stdout. Bodies are written whole, one at a time.
pub struct StdoutSink {
    out: Mutex<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for StdoutSink {
    async fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(data).await?;
        out.flush().await
    }
}

#[handler]
pub async fn post_log(body: Body, sink: Data<&Arc<dyn LogSink>>) -> Response {
    let data = match body.into_bytes().await {
        Ok(data) => data,
        Err(e) => {
            error!("Error reading log body: {}", e);
            return error_response(e.to_string());
        }
    };
    debug!("Relaying {} bytes", data.len());
    if let Err(e) = sink.write(&data).await {
        error!("Error writing log body: {}", e);
        return error_response(e.to_string());
    }
    StatusCode::OK.into_response()
}

fn error_response(details: String) -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(details)
}
