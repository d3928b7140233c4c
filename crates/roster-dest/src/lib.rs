//! Destination side of roster synchronisation.
//!
//! The [`Destination`] trait exposes the listings the reconciler reads and a
//! single mutation entry point taking an [`roster_model::Operation`].
//! [`HttpDestination`] talks to the school-management REST API,
//! [`DryRunDestination`] answers mutations with synthetic responses and
//! [`MemoryDestination`] keeps everything in process.

pub mod destination;
pub mod dry_run;
pub mod error;
pub mod http;
pub mod memory;

pub use destination::{Destination, created_id};
pub use dry_run::DryRunDestination;
pub use error::DestinationError;
pub use http::{DestinationCredentials, HttpDestination};
pub use memory::MemoryDestination;
