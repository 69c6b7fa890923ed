// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use poem::http::{header, StatusCode};
use poem::web::headers::{authorization::Basic, Authorization, HeaderMapExt};
use poem::{Endpoint, IntoResponse, Middleware, Request, Response, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::Credentials;

/// HTTP basic auth against a single credential pair.
pub struct BasicAuth {
    realm: String,
    credentials: Credentials,
}

impl BasicAuth {
    pub fn new(realm: &str, credentials: Credentials) -> Self {
        Self {
            realm: realm.to_string(),
            credentials,
        }
    }
}

impl<E: Endpoint> Middleware<E> for BasicAuth {
    type Output = BasicAuthEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        BasicAuthEndpoint {
            ep,
            challenge: format!("Basic realm=\"{}\"", self.realm),
            credentials: self.credentials.clone(),
        }
    }
}

pub struct BasicAuthEndpoint<E> {
    ep: E,
    challenge: String,
    credentials: Credentials,
}

impl<E> BasicAuthEndpoint<E> {
    fn is_authorized(&self, req: &Request) -> bool {
        match req.headers().typed_get::<Authorization<Basic>>() {
            Some(auth) => {
                let username = same_secret(auth.username(), &self.credentials.username);
                let password = same_secret(auth.password(), &self.credentials.password);
                username & password
            }
            None => false,
        }
    }
}

/// Compares the SHA-256 digests of both values, touching every byte, so the
/// time taken does not depend on where they first differ.
fn same_secret(given: &str, expected: &str) -> bool {
    let given = Sha256::digest(given.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    given
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

impl<E: Endpoint> Endpoint for BasicAuthEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        if self.is_authorized(&req) {
            return self.ep.call(req).await.map(IntoResponse::into_response);
        }
        debug!("Rejected unauthorized request to {}", req.uri().path());
        Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(header::WWW_AUTHENTICATE, self.challenge.clone())
            .finish())
    }
}
