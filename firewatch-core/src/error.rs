use firewatch_upstream::UpstreamError;
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while answering one active-fires request.
/// None of these are fatal to the service.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("country not found: {0}")]
    CountryNotFound(String),

    #[error("{service} is unavailable: {message}")]
    UpstreamUnavailable {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned a malformed response: {message}")]
    MalformedUpstream {
        service: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameter,
    CountryNotFound,
    UpstreamUnavailable,
    MalformedUpstreamResponse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::CountryNotFound => "country_not_found",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::MalformedUpstreamResponse => "malformed_upstream_response",
        }
    }
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            GatewayError::CountryNotFound(_) => ErrorKind::CountryNotFound,
            GatewayError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            GatewayError::MalformedUpstream { .. } => ErrorKind::MalformedUpstreamResponse,
        }
    }

    pub fn invalid(msg: impl ToString) -> Self {
        GatewayError::InvalidParameter(msg.to_string())
    }

    pub fn malformed(service: &'static str, msg: impl ToString) -> Self {
        GatewayError::MalformedUpstream {
            service,
            message: msg.to_string(),
        }
    }

    /// Classify an upstream client error for the given provider.
    pub fn from_upstream(service: &'static str, err: UpstreamError) -> Self {
        match err {
            UpstreamError::InvalidMapKey(msg) => GatewayError::InvalidParameter(msg),
            err if err.is_unavailable() => GatewayError::UpstreamUnavailable {
                service,
                message: err.to_string(),
            },
            UpstreamError::InvalidUrl(msg) => GatewayError::UpstreamUnavailable {
                service,
                message: format!("misconfigured endpoint {}", msg),
            },
            err => GatewayError::MalformedUpstream {
                service,
                message: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
