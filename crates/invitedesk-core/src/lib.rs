//! # invitedesk-core
//!
//! Core business logic for the invitedesk intake client.
//!
//! This crate provides:
//! - **Invitation queue** - offline-first local queue with per-record
//!   sync state (pending/syncing/synced/error)
//! - **Quota evaluation** - per-inviter, per-day, per-session capacity
//!   checks, run optimistically on the client and authoritatively on the
//!   backend
//! - **Sync orchestration** - one-at-a-time reconciliation of the queue
//!   against the remote store gateway
//! - **Local persistence** - durable `SQLite`-backed state slots
//! - **Canonical time** - one configured zone for every timestamp and
//!   day key

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod invitation;
pub mod quota;
pub mod service;
pub mod session;
pub mod store;
pub mod sync;
pub mod time;
pub mod user;

pub use error::{Error, Result, ValidationError};
pub use invitation::{
    InvitationInput, InvitationPatch, InvitationRecord, LocalId, QueueManager,
    ScreeningSelections, SyncStatus,
};
pub use quota::{InvitationCounts, QuotaDecision, QuotaLimits, SessionBucket, evaluate};
pub use service::InviteService;
pub use session::{AppointmentType, SessionDescriptor};
pub use store::{StoreRepository, StoredState};
pub use sync::{SyncOrchestrator, SyncOutcome, SyncSkip};
pub use time::{Calendar, Clock, MockClock, SystemClock};
pub use user::{Role, StaffUser};
