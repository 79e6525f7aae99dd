use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{service} answered with HTTP {status}: {message}")]
    StatusError {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error(
        "the access limit of the FIRMS map key is reached, try again in 10 minutes or use a different key"
    )]
    AccessLimitReached,

    #[error("Invalid FIRMS map key: {0}")]
    InvalidMapKey(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJsonError(#[from] geojson::Error),
}

impl UpstreamError {
    /// True when the provider could not be reached or refused to serve the request,
    /// as opposed to answering with data we could not make sense of.
    pub fn is_unavailable(&self) -> bool {
        match self {
            UpstreamError::HttpError(e) => !e.is_decode(),
            UpstreamError::StatusError { .. } | UpstreamError::AccessLimitReached => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
