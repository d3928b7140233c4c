//! Source snapshot ingestion for roster synchronisation.

pub mod client;
pub mod extract;
pub mod flatten;
pub mod snapshot;
pub mod table;

pub use client::{PowerSchoolClient, SourceApi, SourceCredentials};
pub use flatten::{ShapeMismatch, flatten, lookup};
pub use snapshot::{QuerySpec, SnapshotLoader, SourceEntity, SourceQueries, SourceSnapshot};
pub use table::FlatTable;
