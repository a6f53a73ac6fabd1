//! Local invitation queue.
//!
//! The queue manager owns the in-memory queue and the current user, and
//! writes through to the local record store after every mutation. All
//! mutation goes through `&mut self`, so a single owner serializes the
//! queue even on a multi-threaded runtime.

use tracing::{debug, warn};

use super::model::{
    InvitationInput, InvitationPatch, InvitationRecord, LocalId, SyncStatus,
};
use crate::error::Result;
use crate::quota::{InvitationCounts, SessionBucket};
use crate::session::SessionDescriptor;
use crate::store::StoreRepository;
use crate::time::{Calendar, short_day_key};
use crate::user::StaffUser;

/// Owner of the local invitation queue and the current-user slot.
pub struct QueueManager {
    store: StoreRepository,
    calendar: Calendar,
    records: Vec<InvitationRecord>,
    current_user: Option<StaffUser>,
}

impl QueueManager {
    /// Loads the queue from the local record store.
    ///
    /// A store failure yields an empty queue and no user; capture must
    /// stay possible even when local state cannot be read.
    pub async fn load(store: StoreRepository, calendar: Calendar) -> Self {
        let state = store.load().await;
        Self {
            store,
            calendar,
            records: state.records,
            current_user: state.current_user,
        }
    }

    /// All records, most recent first.
    #[must_use]
    pub fn records(&self) -> &[InvitationRecord] {
        &self.records
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn current_user(&self) -> Option<&StaffUser> {
        self.current_user.as_ref()
    }

    /// The store this queue persists through.
    #[must_use]
    pub const fn store(&self) -> &StoreRepository {
        &self.store
    }

    /// The calendar this queue stamps records with.
    #[must_use]
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Stores the signed-in user.
    pub async fn sign_in(&mut self, user: StaffUser) {
        self.current_user = Some(user);
        self.persist().await;
    }

    /// Clears the signed-in user. The queue itself is kept.
    pub async fn sign_out(&mut self) {
        self.current_user = None;
        self.persist().await;
    }

    /// Creates a record from validated input and queues it at the head.
    ///
    /// New records always start [`SyncStatus::Pending`]; head insertion
    /// keeps listings most-recent-first.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing required fields or a
    /// malformed session descriptor; the queue is untouched on failure.
    pub async fn create(
        &mut self,
        input: InvitationInput,
        inviter: &str,
    ) -> Result<InvitationRecord> {
        let descriptor = input.validate()?;
        let now = self.calendar.now();

        let record = InvitationRecord {
            local_id: LocalId::generate(now),
            server_id: None,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            create_time: now,
            last_modified: now,
            name: input.name,
            phone1: input.phone1,
            phone2: input.phone2,
            screening: input.screening,
            notes: input.notes,
            session_info: input.session_info,
            date: descriptor.short_date().to_string(),
            year: self.calendar.year(),
            region: descriptor.region,
            location: descriptor.location,
            session: input.session,
            appointment_type: descriptor.appointment_type,
            inviter: inviter.to_string(),
            invite_date: self.calendar.today_short(),
        };

        self.records.insert(0, record.clone());
        self.persist().await;

        debug!(
            local_id = %record.local_id,
            counts = ?self.counts_for_day(inviter, &record.invite_date),
            "invitation queued"
        );
        Ok(record)
    }

    /// Merges a patch into an existing record.
    ///
    /// Returns `Ok(false)` when no record matches. Editing a synced
    /// record demotes it to [`SyncStatus::Pending`] (the edit invalidates
    /// the prior sync); Pending/Syncing/Error are left as they are.
    /// `invite_date` and `create_time` are never recomputed.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the patch carries a malformed
    /// session descriptor; the record is untouched in that case.
    pub async fn update(&mut self, local_id: &LocalId, patch: InvitationPatch) -> Result<bool> {
        // Parse before locating so a malformed descriptor cannot leave a
        // half-applied patch behind.
        let descriptor = match &patch.session_info {
            Some(raw) => Some((raw.clone(), SessionDescriptor::parse(raw)?)),
            None => None,
        };

        let now = self.calendar.now();
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| &record.local_id == local_id)
        else {
            return Ok(false);
        };

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(phone1) = patch.phone1 {
            record.phone1 = phone1;
        }
        if let Some(phone2) = patch.phone2 {
            record.phone2 = phone2;
        }
        if let Some(screening) = patch.screening {
            record.screening = screening;
        }
        if let Some(notes) = patch.notes {
            record.notes = notes;
        }
        if let Some(session) = patch.session {
            record.session = session;
        }
        if let Some((raw, descriptor)) = descriptor {
            record.apply_descriptor(&raw, &descriptor);
        }

        record.last_modified = now;
        if record.sync_status == SyncStatus::Synced {
            record.sync_status = SyncStatus::Pending;
            record.sync_error = None;
        }

        self.persist().await;
        Ok(true)
    }

    /// Removes a record locally. Returns `false` when no record matches.
    ///
    /// Removal is local-only: a record already accepted remotely is not
    /// deleted from the remote store.
    pub async fn delete(&mut self, local_id: &LocalId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| &record.local_id != local_id);
        if self.records.len() == before {
            return false;
        }
        self.persist().await;
        true
    }

    /// Looks a record up by local id.
    #[must_use]
    pub fn get(&self, local_id: &LocalId) -> Option<&InvitationRecord> {
        self.records
            .iter()
            .find(|record| &record.local_id == local_id)
    }

    /// Records captured on `day`, visible to `viewer`.
    ///
    /// Regular staff see only their own records; the administrative role
    /// bypasses the inviter filter. `day` may be `YYYYMMDD` or `MMDD`.
    #[must_use]
    pub fn list_for_day(&self, viewer: &StaffUser, day: &str) -> Vec<&InvitationRecord> {
        let day = short_day_key(day);
        self.records
            .iter()
            .filter(|record| {
                record.invite_date == day
                    && (viewer.is_admin() || record.inviter == viewer.name)
            })
            .collect()
    }

    /// Derived per-bucket counts of quota-relevant records for an inviter
    /// and day: primary bookings in Pending/Syncing/Synced.
    #[must_use]
    pub fn counts_for_day(&self, inviter: &str, day: &str) -> InvitationCounts {
        let day = short_day_key(day);
        let mut counts = InvitationCounts::default();
        for record in &self.records {
            if record.invite_date == day
                && record.inviter == inviter
                && record.appointment_type.is_primary()
                && record.sync_status.counts_toward_quota()
                && let Some(bucket) = SessionBucket::from_label(&record.session)
            {
                counts.bump(bucket);
            }
        }
        counts
    }

    /// Ids of all records a sync run should submit, in queue order.
    #[must_use]
    pub fn sync_candidates(&self) -> Vec<LocalId> {
        self.records
            .iter()
            .filter(|record| record.sync_status.is_sync_candidate())
            .map(|record| record.local_id.clone())
            .collect()
    }

    /// Flips every listed candidate to [`SyncStatus::Syncing`] and
    /// persists once, so the state change is visible immediately.
    pub async fn mark_syncing(&mut self, local_ids: &[LocalId]) {
        for record in &mut self.records {
            if local_ids.contains(&record.local_id)
                && record.sync_status.is_sync_candidate()
            {
                record.sync_status = SyncStatus::Syncing;
            }
        }
        self.persist().await;
    }

    /// Records a successful submission. Returns `false` without side
    /// effects when the record was deleted mid-run.
    pub async fn mark_synced(&mut self, local_id: &LocalId, server_id: String) -> bool {
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| &record.local_id == local_id)
        else {
            return false;
        };
        record.sync_status = SyncStatus::Synced;
        record.server_id = Some(server_id);
        record.sync_error = None;
        self.persist().await;
        true
    }

    /// Records a failed submission. Returns `false` without side effects
    /// when the record was deleted mid-run.
    pub async fn mark_error(&mut self, local_id: &LocalId, message: String) -> bool {
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| &record.local_id == local_id)
        else {
            return false;
        };
        record.sync_status = SyncStatus::Error;
        record.sync_error = Some(message);
        self.persist().await;
        true
    }

    /// Writes the queue and current user through to the store.
    ///
    /// Store failures are logged and swallowed; the in-memory state
    /// remains authoritative for the session.
    pub async fn persist(&self) {
        if let Err(error) = self
            .store
            .save(&self.records, self.current_user.as_ref())
            .await
        {
            warn!(%error, "failed to persist local state; continuing in memory");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::time::{MockClock, canonical_offset};
    use crate::user::Role;
    use chrono::Duration;
    use std::sync::Arc;

    fn input(name: &str, session: &str, descriptor: &str) -> InvitationInput {
        InvitationInput {
            name: name.to_string(),
            phone1: "0912345678".to_string(),
            session: session.to_string(),
            session_info: descriptor.to_string(),
            ..Default::default()
        }
    }

    async fn queue_at(clock: Arc<MockClock>) -> QueueManager {
        let store = StoreRepository::in_memory().await.unwrap();
        let calendar = Calendar::new(clock, canonical_offset());
        QueueManager::load(store, calendar).await
    }

    fn fixed_clock() -> Arc<MockClock> {
        Arc::new(MockClock::new("2026-03-01T01:00:00Z".parse().unwrap()))
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let mut queue = queue_at(fixed_clock()).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();

        assert_eq!(record.sync_status, SyncStatus::Pending);
        assert_eq!(record.invite_date, "0301");
        assert_eq!(record.year, "2026");

        let viewer = StaffUser::new("chen", Role::Staff);
        let listed = queue.list_for_day(&viewer, "20260301");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].local_id, record.local_id);
        assert_eq!(listed[0].name, "Lin Mei");
    }

    #[tokio::test]
    async fn new_records_are_listed_most_recent_first() {
        let mut queue = queue_at(fixed_clock()).await;
        queue
            .create(
                input("First", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        queue
            .create(
                input("Second", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();

        assert_eq!(queue.records()[0].name, "Second");
        assert_eq!(queue.records()[1].name, "First");
    }

    #[tokio::test]
    async fn listing_is_scoped_per_inviter_except_admin() {
        let mut queue = queue_at(fixed_clock()).await;
        queue
            .create(
                input("Mine", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        queue
            .create(
                input("Theirs", "morning", "20260301-North-Clinic A-primary"),
                "wang",
            )
            .await
            .unwrap();

        let staff = StaffUser::new("chen", Role::Staff);
        assert_eq!(queue.list_for_day(&staff, "0301").len(), 1);

        let admin = StaffUser::new("supervisor", Role::Admin);
        assert_eq!(queue.list_for_day(&admin, "0301").len(), 2);
    }

    #[tokio::test]
    async fn empty_patch_bumps_last_modified_only() {
        let clock = fixed_clock();
        let mut queue = queue_at(Arc::clone(&clock)).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();

        clock.advance(Duration::minutes(5));
        let updated = queue
            .update(&record.local_id, InvitationPatch::default())
            .await
            .unwrap();
        assert!(updated);

        let stored = queue.get(&record.local_id).unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Pending);
        assert_eq!(stored.name, record.name);
        assert_eq!(stored.invite_date, record.invite_date);
        assert!(stored.last_modified > record.last_modified);
    }

    #[tokio::test]
    async fn empty_patch_leaves_error_status_alone() {
        let mut queue = queue_at(fixed_clock()).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        queue
            .mark_error(&record.local_id, "quota reached".to_string())
            .await;

        assert!(queue
            .update(&record.local_id, InvitationPatch::default())
            .await
            .unwrap());

        let stored = queue.get(&record.local_id).unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Error);
        assert_eq!(stored.sync_error.as_deref(), Some("quota reached"));
    }

    #[tokio::test]
    async fn editing_a_synced_record_demotes_to_pending() {
        let mut queue = queue_at(fixed_clock()).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        queue.mark_syncing(&[record.local_id.clone()]).await;
        assert!(queue
            .mark_synced(&record.local_id, "INV123".to_string())
            .await);

        let patch = InvitationPatch {
            phone1: Some("0987654321".to_string()),
            ..Default::default()
        };
        assert!(queue.update(&record.local_id, patch).await.unwrap());

        let stored = queue.get(&record.local_id).unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Pending);
        assert_eq!(stored.phone1, "0987654321");
        assert!(stored.sync_error.is_none());
    }

    #[tokio::test]
    async fn patching_the_descriptor_rederives_session_fields() {
        let mut queue = queue_at(fixed_clock()).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();

        let patch = InvitationPatch {
            session_info: Some("20260405-South-Clinic B".to_string()),
            ..Default::default()
        };
        assert!(queue.update(&record.local_id, patch).await.unwrap());

        let stored = queue.get(&record.local_id).unwrap();
        assert_eq!(stored.date, "0405");
        assert_eq!(stored.region, "South");
        assert_eq!(stored.location, "Clinic B");
        assert!(!stored.appointment_type.is_primary());
        // The quota bucketing key is frozen at creation.
        assert_eq!(stored.invite_date, "0301");
    }

    #[tokio::test]
    async fn malformed_descriptor_patch_leaves_record_untouched() {
        let mut queue = queue_at(fixed_clock()).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();

        let patch = InvitationPatch {
            name: Some("Changed".to_string()),
            session_info: Some("garbage".to_string()),
            ..Default::default()
        };
        assert!(queue.update(&record.local_id, patch).await.is_err());

        let stored = queue.get(&record.local_id).unwrap();
        assert_eq!(stored.name, "Lin Mei");
        assert_eq!(stored.region, "North");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_records() {
        let mut queue = queue_at(fixed_clock()).await;
        let ghost = LocalId("inv-0-missing".to_string());
        assert!(!queue
            .update(&ghost, InvitationPatch::default())
            .await
            .unwrap());
        assert!(!queue.delete(&ghost).await);
    }

    #[tokio::test]
    async fn counts_track_primary_records_excluding_errors() {
        let mut queue = queue_at(fixed_clock()).await;
        let first = queue
            .create(
                input("A", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        queue
            .create(
                input("B", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        // Secondary bookings never occupy a slot.
        queue
            .create(input("C", "morning", "20260301-North-Clinic A"), "chen")
            .await
            .unwrap();

        assert_eq!(queue.counts_for_day("chen", "0301").morning, 2);

        queue
            .mark_error(&first.local_id, "quota reached".to_string())
            .await;
        assert_eq!(queue.counts_for_day("chen", "0301").morning, 1);
    }

    #[tokio::test]
    async fn status_marks_on_deleted_records_return_false() {
        let mut queue = queue_at(fixed_clock()).await;
        let record = queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();
        queue.mark_syncing(&[record.local_id.clone()]).await;
        assert!(queue.delete(&record.local_id).await);

        // The sync run's write-back must not resurrect the record.
        assert!(!queue
            .mark_synced(&record.local_id, "INV123".to_string())
            .await);
        assert!(!queue
            .mark_error(&record.local_id, "late failure".to_string())
            .await);
        assert!(queue.records().is_empty());
    }

    #[tokio::test]
    async fn queue_survives_reload_through_store() {
        let store = StoreRepository::in_memory().await.unwrap();
        let calendar = Calendar::new(fixed_clock(), canonical_offset());

        let mut queue = QueueManager::load(store.clone(), calendar.clone()).await;
        queue
            .sign_in(StaffUser::new("chen", Role::Staff))
            .await;
        queue
            .create(
                input("Lin Mei", "morning", "20260301-North-Clinic A-primary"),
                "chen",
            )
            .await
            .unwrap();

        let reloaded = QueueManager::load(store, calendar).await;
        assert_eq!(reloaded.records().len(), 1);
        assert_eq!(reloaded.current_user().unwrap().name, "chen");
    }
}
