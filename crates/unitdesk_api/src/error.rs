//! Mapping from core failures to responses.

use crate::response::{ApiResponse, StatusCode};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};
use unitdesk_core::{ServiceError, ValidationErrors, UNIT_NOT_FOUND_ERR};

const INTERNAL_ERR: &str = "Internal server error";

/// Anything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request payload or query.
    Validation(ValidationErrors),
    /// Path id that cannot name any stored unit.
    UnknownId(String),
    Service(ServiceError),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnknownId(_) => f.write_str(UNIT_NOT_FOUND_ERR),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::UnknownId(_) => None,
            Self::Service(err) => Some(err),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnknownId(_) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::TransitionForbidden(_)) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::Setup(_) | ServiceError::Repo(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// `{ "error": ... }` response. Internal details are logged, not returned.
    pub fn into_response(self) -> ApiResponse {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(
                "event=api_error module=api status=error http_status={} error={self}",
                status.as_u16()
            );
            return ApiResponse::error(status, INTERNAL_ERR);
        }
        ApiResponse::error(status, self.to_string())
    }
}
