pub mod config;

use std::sync::Arc;

use actix_web::{error::BlockingError, http::StatusCode, web, HttpResponse, ResponseError};
use diesel::r2d2::PoolError;
use serde::Serialize;
use thiserror::Error;

use crate::{auth::token::Authenticator, database::store::Store};

/** Shared by every worker: the store and the token authority */
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, authenticator: Authenticator) -> Self {
        Self {
            store,
            authenticator: Arc::new(authenticator),
        }
    }

    /// Runs a store operation on the blocking thread pool.
    ///
    /// Every store call is synchronous (diesel), so handlers go through here
    /// instead of touching the store from the async executor.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, AppError>
    where
        F: FnOnce(&dyn Store) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        web::block(move || operation(store.as_ref())).await?
    }
}

/** Errors surfaced to the caller as `{ "message": ... }` */
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// The cause is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(cause) = self {
            log::error!("request failed: {cause}");
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.to_string(),
        })
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => AppError::NotFound(String::from("Resource not found")),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::Validation(String::from("Resource already exists"))
            }
            Error::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                AppError::Validation(info.message().to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        AppError::Internal(format!("connection pool: {err}"))
    }
}

impl From<BlockingError> for AppError {
    fn from(_: BlockingError) -> Self {
        AppError::Internal(String::from("blocking task was cancelled"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::RsaFailedSigning
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::Crypto(_) => AppError::Internal(format!("token signing: {err}")),
            _ => AppError::Unauthenticated(String::from(
                "Not authorized - token invalid or expired",
            )),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by a fresh in-memory store, for handler tests.
    pub fn in_memory() -> Self {
        use crate::database::memory::MemoryStore;

        Self::new(
            Arc::new(MemoryStore::default()),
            Authenticator::new("test-secret", 1),
        )
    }
}
