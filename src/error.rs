use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error taxonomy. Business-rule failures carry their own
/// variants and map to 4xx; connectivity and unexpected failures map to 5xx
/// with a generic message, never the underlying error text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Email já cadastrado")]
    DuplicateEmail,

    /// Covers both unknown email and wrong password with one message, so the
    /// response never reveals which part of the credential pair was wrong.
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Usuário não encontrado")]
    NotFound,

    #[error("Operação não permitida para esta conta")]
    Forbidden,

    #[error("Serviço indisponível, tente novamente")]
    StoreUnavailable,

    #[error("Erro interno no servidor")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateEmail => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // The unique index on lower(email) is the authoritative duplicate
        // guard; the handler pre-check is only a fast path.
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return Self::DuplicateEmail;
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StoreUnavailable
            }
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(source) => {
                tracing::error!(error = %source, "request failed");
            }
            ApiError::StoreUnavailable => {
                tracing::error!("database unavailable");
            }
            other => {
                tracing::warn!(%status, mensagem = %other, "request rejected");
            }
        }
        // Display strings are client-safe; the Internal source stays in logs.
        let body = Json(json!({
            "sucesso": false,
            "mensagem": self.to_string(),
        }));
        (status, body).into_response()
    }
}
