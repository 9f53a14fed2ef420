use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::model::FieldErrors;
use crate::vin::VinError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("VIN already exists")]
    DuplicateVin,
    #[error("vehicle with VIN {0} not found")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Vin(#[from] VinError),
    #[error("one or more fields are invalid")]
    FieldConstraints(FieldErrors),
    #[error("VIN already exists")]
    DuplicateVin,
    #[error("VIN in body must match VIN in URL")]
    VinMismatch,
    #[error("Vehicle with VIN {0} not found")]
    NotFound(String),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("storage failure")]
    Storage(#[source] sqlx::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateVin => ApiError::DuplicateVin,
            RepositoryError::NotFound(vin) => ApiError::NotFound(vin),
            RepositoryError::Storage(source) => ApiError::Storage(source),
        }
    }
}

/// The one error body every failing request receives.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    fn field_errors(&self) -> Option<FieldErrors> {
        let single = |field: &str, reason: String| FieldErrors::from([(field.to_string(), vec![reason])]);
        match self {
            ApiError::Vin(err) => Some(single("vin", err.to_string())),
            ApiError::FieldConstraints(errors) => Some(errors.clone()),
            ApiError::DuplicateVin | ApiError::VinMismatch => Some(single("vin", self.to_string())),
            ApiError::MalformedBody(reason) => Some(single("body", reason.clone())),
            ApiError::NotFound(_) | ApiError::Storage(_) => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(source) = self {
            log::error!("Storage failure: {:?}", source);
        }

        let detail = match self {
            ApiError::Vin(_) | ApiError::FieldConstraints(_) | ApiError::MalformedBody(_) => {
                "Validation failed".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail,
            errors: self.field_errors(),
        })
    }
}
