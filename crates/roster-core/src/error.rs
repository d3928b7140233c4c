use roster_dest::DestinationError;
use roster_model::{IntegrityError, LoadError};
use thiserror::Error;

/// Fatal failure of a reconciliation run.
///
/// Per-operation failures never surface here; the executor records them.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("failed to set up the destination client: {0}")]
    Connect(#[source] DestinationError),

    #[error("failed to list {what} from the destination: {source}")]
    Listing {
        what: &'static str,
        #[source]
        source: DestinationError,
    },
}

impl SyncError {
    pub(crate) fn listing(what: &'static str) -> impl FnOnce(DestinationError) -> Self {
        move |source| Self::Listing { what, source }
    }
}
