//! Local invitation queue: records, sync state, and the queue manager.

mod model;
mod queue;

pub use model::{
    InvitationInput, InvitationPatch, InvitationRecord, LocalId, ScreeningSelections, SyncStatus,
};
pub use queue::QueueManager;
