// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::fmt;

use thiserror::Error;

/// Failure reported by a remote key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Unsupported store url: {url}")]
    UnsupportedUrl { url: String },
    #[error("store task failed: {message}")]
    Task { message: String },
    #[error("write abandoned: {reason}")]
    Cancelled { reason: CancelReason },
}

impl StoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Redis(_) => "STORE_REDIS",
            StoreError::UnsupportedUrl { .. } => "STORE_UNSUPPORTED_URL",
            StoreError::Task { .. } => "STORE_TASK",
            StoreError::Cancelled { .. } => "STORE_CANCELLED",
        }
    }
}

/// Why a [`crate::cache::Cancellation`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Canceled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Canceled => write!(f, "operation canceled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Get,
    Put,
    Delete,
}

impl fmt::Display for CacheOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOp::Get => write!(f, "get"),
            CacheOp::Put => write!(f, "put"),
            CacheOp::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache miss: {key}")]
    CacheMiss { key: String },
    #[error("{op} {key}: {reason}")]
    Cancelled {
        op: CacheOp,
        key: String,
        reason: CancelReason,
    },
    #[error("{op} {key}: {source}")]
    Store {
        op: CacheOp,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("Invalid cache key: keys must not be empty")]
    InvalidKey,
}

impl CacheError {
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::CacheMiss { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::Cancelled { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CacheError::CacheMiss { .. } => "CACHE_MISS",
            CacheError::Cancelled { .. } => "CANCELLED",
            CacheError::Store { .. } => "STORE_ERROR",
            CacheError::InvalidKey => "INVALID_KEY",
        }
    }
}
