use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use thiserror::Error;

use crate::dto::ErrorDto;

/// Shown to the caller whenever the real failure detail must stay server-side.
pub const GENERIC_FAILURE: &str = "An unexpected error occurred during processing";

#[derive(Error, Debug)]
pub enum AsrError {
    /// Rejected upload. The message is precise and safe to show the caller.
    #[error("{0}")]
    InvalidInput(String),
    /// Model load or inference failure in the local backend.
    #[error("model failure: {0}")]
    Model(String),
    /// The remote transcription CLI could not be run or exited non-zero.
    #[error("transcription process failure: {0}")]
    Process(String),
    /// No transcript could be parsed out of the CLI output.
    #[error("{0}")]
    Extraction(String),
    /// Object-storage upload failure.
    #[error("store failure: {0}")]
    Store(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl AsrError {
    /// The body the client sees. Internal detail (paths, exit codes, tokens)
    /// never crosses this boundary.
    fn client_message(&self) -> String {
        match self {
            AsrError::InvalidInput(msg) | AsrError::Extraction(msg) => msg.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl ResponseError for AsrError {
    fn status_code(&self) -> StatusCode {
        match self {
            AsrError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if !matches!(self, AsrError::InvalidInput(_)) {
            error!("Request failed: {self}");
        }
        HttpResponse::build(self.status_code()).json(ErrorDto {
            error: self.client_message(),
        })
    }
}
