//! Durable local persistence.
//!
//! Three named slots back the whole client: the invitation queue, the
//! current user, and the last-sync marker. Loading fails softly (empty
//! state, never an error) so capture keeps working on a damaged store.

mod repository;

use crate::invitation::InvitationRecord;
use crate::user::StaffUser;

pub use repository::StoreRepository;

/// The state the store hands back on load.
#[derive(Debug, Default)]
pub struct StoredState {
    /// The invitation queue, most recent first.
    pub records: Vec<InvitationRecord>,
    /// The signed-in user, if one was persisted.
    pub current_user: Option<StaffUser>,
}
