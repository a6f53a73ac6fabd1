//! Coordinating service owning the application state.
//!
//! One object owns the queue, the orchestrator, and the cached quota
//! limits; everything else receives state through it. This replaces the
//! original client's module-level globals and keeps the whole flow
//! testable without any presentation layer.

use tracing::warn;

use crate::error::{Error, Result};
use crate::invitation::{
    InvitationInput, InvitationPatch, InvitationRecord, LocalId, QueueManager,
};
use crate::quota::{self, InvitationCounts, QuotaLimits};
use crate::session::SessionDescriptor;
use crate::store::StoreRepository;
use crate::sync::{SyncOrchestrator, SyncOutcome, SyncSkip};
use crate::time::Calendar;
use crate::user::StaffUser;
use invitedesk_gateway::{RemoteGateway, SessionTotals};

/// The application's single coordinating object.
pub struct InviteService<G> {
    queue: QueueManager,
    orchestrator: SyncOrchestrator<G>,
    limits: Option<QuotaLimits>,
}

impl<G: RemoteGateway> InviteService<G> {
    /// Opens the service over a local store, calendar, and gateway.
    ///
    /// Loads whatever local state survives from the previous session; a
    /// damaged store degrades to an empty queue.
    pub async fn open(store: StoreRepository, calendar: Calendar, gateway: G) -> Self {
        let queue = QueueManager::load(store, calendar).await;
        Self {
            queue,
            orchestrator: SyncOrchestrator::new(gateway),
            limits: None,
        }
    }

    /// The underlying queue.
    #[must_use]
    pub const fn queue(&self) -> &QueueManager {
        &self.queue
    }

    /// The underlying orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &SyncOrchestrator<G> {
        &self.orchestrator
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn current_user(&self) -> Option<&StaffUser> {
        self.queue.current_user()
    }

    /// The cached quota limits, if any have been fetched.
    #[must_use]
    pub const fn cached_limits(&self) -> Option<QuotaLimits> {
        self.limits
    }

    /// Authenticates against the backend and stores the user locally.
    ///
    /// Quota limits are refreshed best-effort: a failure there is logged
    /// and does not fail the sign-in (the server stays authoritative at
    /// sync time regardless).
    ///
    /// # Errors
    ///
    /// Returns a gateway error when the backend rejects the credentials
    /// or is unreachable.
    pub async fn sign_in(&mut self, username: &str, password: &str) -> Result<StaffUser> {
        let remote = self
            .orchestrator
            .gateway()
            .authenticate(username, password)
            .await?;
        let user = StaffUser::from(remote);
        self.queue.sign_in(user.clone()).await;

        if let Err(error) = self.refresh_limits().await {
            warn!(%error, "could not refresh quota limits at sign-in");
        }
        Ok(user)
    }

    /// Clears the signed-in user and the cached limits.
    pub async fn sign_out(&mut self) {
        self.queue.sign_out().await;
        self.limits = None;
    }

    /// Fetches and caches today's quota limits for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] without a user, or a gateway error.
    pub async fn refresh_limits(&mut self) -> Result<QuotaLimits> {
        let user = self.queue.current_user().ok_or(Error::NotSignedIn)?;
        let totals = self
            .orchestrator
            .gateway()
            .today_quota(&user.name, &self.queue.calendar().today())
            .await?;
        let limits = QuotaLimits::from(totals);
        self.limits = Some(limits);
        Ok(limits)
    }

    /// Validates, quota-gates, and queues one submission.
    ///
    /// The quota evaluation here is the optimistic half: locally derived
    /// counts against cached limits. It is advisory — with no cached
    /// limits (fresh offline install) the record queues anyway and the
    /// backend adjudicates at sync time. A denial leaves the queue
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`], a validation error, or
    /// [`Error::QuotaExceeded`] with the user-facing reason.
    pub async fn submit(&mut self, input: InvitationInput) -> Result<InvitationRecord> {
        let user = self.queue.current_user().ok_or(Error::NotSignedIn)?;
        let inviter = user.name.clone();

        if let Some(limits) = self.limits {
            let descriptor = SessionDescriptor::parse(&input.session_info)?;
            let counts = self
                .queue
                .counts_for_day(&inviter, &self.queue.calendar().today_short());
            let decision = quota::evaluate(
                &input.session,
                descriptor.appointment_type,
                &counts,
                &limits,
            );
            if !decision.is_allowed() {
                return Err(Error::QuotaExceeded {
                    reason: decision.to_string(),
                });
            }
        }

        self.queue.create(input, &inviter).await
    }

    /// Merges a patch into an existing record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed descriptor patch.
    pub async fn edit(&mut self, local_id: &LocalId, patch: InvitationPatch) -> Result<bool> {
        self.queue.update(local_id, patch).await
    }

    /// Removes a record locally.
    pub async fn remove(&mut self, local_id: &LocalId) -> bool {
        self.queue.delete(local_id).await
    }

    /// Today's records visible to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] without a user.
    pub fn list_today(&self) -> Result<Vec<&InvitationRecord>> {
        let viewer = self.queue.current_user().ok_or(Error::NotSignedIn)?;
        Ok(self
            .queue
            .list_for_day(viewer, &self.queue.calendar().today_short()))
    }

    /// Locally derived quota counts for the signed-in user today.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] without a user.
    pub fn counts_today(&self) -> Result<InvitationCounts> {
        let user = self.queue.current_user().ok_or(Error::NotSignedIn)?;
        Ok(self
            .queue
            .counts_for_day(&user.name, &self.queue.calendar().today_short()))
    }

    /// Authoritative counts from the remote store, for comparison against
    /// the local derivation when staleness is suspected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] without a user, or a gateway error.
    pub async fn remote_counts_today(&self) -> Result<SessionTotals> {
        let user = self.queue.current_user().ok_or(Error::NotSignedIn)?;
        let totals = self
            .orchestrator
            .gateway()
            .today_invitations(&user.name, &self.queue.calendar().today())
            .await?;
        Ok(totals)
    }

    /// Explicit sync request.
    ///
    /// # Errors
    ///
    /// Returns the skip reason (offline / already running) with
    /// user-facing wording.
    pub async fn sync_now(&mut self) -> std::result::Result<SyncOutcome, SyncSkip> {
        self.orchestrator.trigger_manual(&mut self.queue).await
    }

    /// Interval/reconnect sync entry point; quietly does nothing when a
    /// precondition fails.
    pub async fn sync_tick(&mut self) -> Option<SyncOutcome> {
        self.orchestrator.trigger_automatic(&mut self.queue).await
    }

    /// Records a connectivity change.
    pub fn set_online(&self, online: bool) {
        self.orchestrator.set_online(online);
    }

    /// The instant of the last completed sync run.
    pub async fn last_sync(&self) -> Option<String> {
        self.queue.store().last_sync().await
    }
}
