use thiserror::Error;

/// Failure talking to the destination.
#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} => {status}\n{body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{action} rejected: {message}")]
    Rejected { action: String, message: String },
}

impl DestinationError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}
