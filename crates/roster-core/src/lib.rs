//! Roster reconciliation engine.
//!
//! Compares a loaded [`roster_ingest::SourceSnapshot`] against the live
//! destination and applies the operations that make the destination match:
//!
//! - **Teachers**: created when missing
//! - **Students**: created, unarchived, archived, regrouped and field-synced
//! - **Parents**: created, unarchived and linked to their children
//! - **Enrollments**: stale memberships removed, new ones added once the
//!   class term has begun
//!
//! # Example
//!
//! ```ignore
//! use roster_core::{SyncContext, reconcile};
//! use roster_model::SyncOptions;
//!
//! let context = SyncContext::new(SyncOptions::new(run_date));
//! let outcome = reconcile(&context, &snapshot, &mut destination);
//! for record in &outcome.log.records {
//!     println!("{} {}", record.action, record.description);
//! }
//! ```

pub mod advisor;
pub mod context;
pub mod dates;
pub mod error;
pub mod executor;
pub mod grade;
pub mod pending;
pub mod reconcile;
pub mod state;

pub use advisor::{AdvisorMatch, resolve_advisor};
pub use context::SyncContext;
pub use dates::{parse_destination_date, parse_source_date};
pub use error::SyncError;
pub use executor::{ExecutionOutcome, Executor};
pub use grade::grade_bucket;
pub use pending::PendingUpdates;
pub use reconcile::{Reconciler, SyncOutcome, profile_diff, reconcile};
pub use state::DestinationState;
