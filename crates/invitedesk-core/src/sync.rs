//! Sync orchestration between the local queue and the remote store.
//!
//! One run at a time, one record at a time. Candidates (Pending and
//! Error records) are flipped to Syncing up front so the state change is
//! visible immediately, then submitted strictly sequentially through the
//! gateway with a short courtesy pause between calls. A record's failure
//! is recorded on that record and never aborts the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::invitation::QueueManager;
use invitedesk_gateway::RemoteGateway;

/// Pause between successive gateway submissions. A courtesy to the
/// backend, not a correctness requirement.
const DEFAULT_PAUSE: Duration = Duration::from_millis(300);

/// Aggregate result of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Records accepted by the remote store.
    pub succeeded: usize,
    /// Records that ended the run in the Error state.
    pub failed: usize,
    /// Candidates the run started with.
    pub total: usize,
}

impl SyncOutcome {
    /// Outcome of a run with nothing to do.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            total: 0,
        }
    }

    /// Returns true when no record failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Why a sync trigger did not start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSkip {
    /// No connectivity; nothing was attempted.
    Offline,
    /// Another run is in progress; the trigger was dropped, not queued.
    AlreadyRunning,
    /// No signed-in user.
    NotSignedIn,
}

impl std::fmt::Display for SyncSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => {
                write!(f, "offline — records will sync when the connection returns")
            }
            Self::AlreadyRunning => write!(f, "a sync is already running, please wait"),
            Self::NotSignedIn => write!(f, "sign in before syncing"),
        }
    }
}

/// Drives reconciliation of the local queue against the remote store.
pub struct SyncOrchestrator<G> {
    gateway: G,
    online: AtomicBool,
    in_progress: AtomicBool,
    pause: Duration,
}

impl<G: RemoteGateway> SyncOrchestrator<G> {
    /// Creates an orchestrator over the given gateway. Connectivity
    /// starts out assumed.
    pub const fn new(gateway: G) -> Self {
        Self {
            gateway,
            online: AtomicBool::new(true),
            in_progress: AtomicBool::new(false),
            pause: DEFAULT_PAUSE,
        }
    }

    /// Overrides the pause between successive submissions.
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// The gateway this orchestrator submits through.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Records a connectivity change. Reconnects should be followed by
    /// [`Self::trigger_automatic`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Current connectivity assumption.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Interval/reconnect entry point.
    ///
    /// Quietly does nothing when offline, already running, or no user is
    /// signed in; returns the outcome otherwise.
    pub async fn trigger_automatic(&self, queue: &mut QueueManager) -> Option<SyncOutcome> {
        match self.admit(queue.current_user().is_some()) {
            Ok(()) => {}
            Err(skip) => {
                debug!(%skip, "automatic sync skipped");
                return None;
            }
        }
        Some(self.run_guarded(queue).await)
    }

    /// Explicit user request.
    ///
    /// # Errors
    ///
    /// Returns the skip reason (with user-facing wording) when offline or
    /// when a run is already in progress; no side effects in either case.
    pub async fn trigger_manual(
        &self,
        queue: &mut QueueManager,
    ) -> Result<SyncOutcome, SyncSkip> {
        // Manual triggers don't require a signed-in user: the records
        // already carry their inviter.
        self.admit(true)?;
        Ok(self.run_guarded(queue).await)
    }

    /// Checks the preconditions and claims the run-in-progress flag.
    fn admit(&self, signed_in: bool) -> Result<(), SyncSkip> {
        if !self.is_online() {
            return Err(SyncSkip::Offline);
        }
        if !signed_in {
            return Err(SyncSkip::NotSignedIn);
        }
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncSkip::AlreadyRunning);
        }
        Ok(())
    }

    /// Runs with the flag held; releases it when done.
    async fn run_guarded(&self, queue: &mut QueueManager) -> SyncOutcome {
        let outcome = self.run(queue).await;
        self.in_progress.store(false, Ordering::SeqCst);
        outcome
    }

    /// One reconciliation pass over all Pending and Error records.
    async fn run(&self, queue: &mut QueueManager) -> SyncOutcome {
        let candidates = queue.sync_candidates();
        let total = candidates.len();
        if candidates.is_empty() {
            debug!("nothing to sync");
            return SyncOutcome::empty();
        }

        info!(total, "sync run started");
        queue.mark_syncing(&candidates).await;

        let mut succeeded = 0;
        let mut failed = 0;

        for (index, local_id) in candidates.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pause).await;
            }

            // A record can be gone by the time its turn comes; skip
            // rather than resurrect it.
            let Some(record) = queue.get(local_id) else {
                debug!(%local_id, "record removed mid-run; skipping");
                continue;
            };
            let submission = record.to_submission();

            match self.gateway.submit_invitation(&submission).await {
                Ok(ack) => {
                    if queue.mark_synced(local_id, ack.invitation_id).await {
                        succeeded += 1;
                    }
                }
                Err(error) => {
                    warn!(%local_id, %error, "submission failed");
                    if queue.mark_error(local_id, error.to_string()).await {
                        failed += 1;
                    }
                }
            }
        }

        queue.persist().await;
        let stamp = queue.calendar().now().to_rfc3339();
        if let Err(error) = queue.store().set_last_sync(&stamp).await {
            warn!(%error, "failed to record last-sync instant");
        }

        info!(succeeded, failed, total, "sync run finished");
        SyncOutcome {
            succeeded,
            failed,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::invitation::InvitationInput;
    use crate::store::StoreRepository;
    use crate::time::{Calendar, MockClock, canonical_offset};
    use crate::user::{Role, StaffUser};
    use invitedesk_gateway::{
        InvitationSubmission, RemoteUser, Result as GatewayResult, SessionTotals, SubmitAck,
    };
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    /// Gateway that accepts every submission and counts the calls.
    struct CountingGateway {
        calls: AtomicUsize,
    }

    impl CountingGateway {
        const fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RemoteGateway for &CountingGateway {
        async fn submit_invitation(
            &self,
            submission: &InvitationSubmission,
        ) -> GatewayResult<SubmitAck> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SubmitAck {
                invitation_id: format!("INV{call}-{}", submission.local_id),
                updated_counts: None,
            })
        }

        async fn today_quota(&self, _: &str, _: &str) -> GatewayResult<SessionTotals> {
            Ok(SessionTotals::default())
        }

        async fn today_invitations(&self, _: &str, _: &str) -> GatewayResult<SessionTotals> {
            Ok(SessionTotals::default())
        }

        async fn authenticate(&self, username: &str, _: &str) -> GatewayResult<RemoteUser> {
            Ok(RemoteUser {
                name: username.to_string(),
                role: None,
            })
        }

        async fn probe(&self) -> GatewayResult<()> {
            Ok(())
        }
    }

    async fn queue_with_user() -> QueueManager {
        let store = StoreRepository::in_memory().await.unwrap();
        let clock = Arc::new(MockClock::new("2026-03-01T01:00:00Z".parse().unwrap()));
        let calendar = Calendar::new(clock, canonical_offset());
        let mut queue = QueueManager::load(store, calendar).await;
        queue.sign_in(StaffUser::new("chen", Role::Staff)).await;
        queue
    }

    fn input(name: &str) -> InvitationInput {
        InvitationInput {
            name: name.to_string(),
            phone1: "0912345678".to_string(),
            session: "morning".to_string(),
            session_info: "20260301-North-Clinic A-primary".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_queue_reports_zero_outcome() {
        let gateway = CountingGateway::new();
        let orchestrator = SyncOrchestrator::new(&gateway).with_pause(Duration::ZERO);
        let mut queue = queue_with_user().await;

        let outcome = orchestrator.trigger_manual(&mut queue).await.unwrap();
        assert_eq!(outcome, SyncOutcome::empty());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_manual_trigger_warns_without_side_effects() {
        let gateway = CountingGateway::new();
        let orchestrator = SyncOrchestrator::new(&gateway).with_pause(Duration::ZERO);
        let mut queue = queue_with_user().await;
        queue.create(input("Lin Mei"), "chen").await.unwrap();

        orchestrator.set_online(false);
        let skipped = orchestrator.trigger_manual(&mut queue).await;
        assert_eq!(skipped, Err(SyncSkip::Offline));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            queue.records()[0].sync_status,
            crate::invitation::SyncStatus::Pending
        );
    }

    #[tokio::test]
    async fn automatic_trigger_requires_signed_in_user() {
        let gateway = CountingGateway::new();
        let orchestrator = SyncOrchestrator::new(&gateway).with_pause(Duration::ZERO);
        let mut queue = queue_with_user().await;
        queue.create(input("Lin Mei"), "chen").await.unwrap();
        queue.sign_out().await;

        assert!(orchestrator.trigger_automatic(&mut queue).await.is_none());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn trigger_while_running_is_dropped() {
        let gateway = CountingGateway::new();
        let orchestrator = SyncOrchestrator::new(&gateway).with_pause(Duration::ZERO);
        let mut queue = queue_with_user().await;

        // Claim the advisory lock the way a running sync would hold it.
        orchestrator.admit(true).unwrap();
        assert!(orchestrator.is_running());

        let skipped = orchestrator.trigger_manual(&mut queue).await;
        assert_eq!(skipped, Err(SyncSkip::AlreadyRunning));
        assert!(orchestrator.trigger_automatic(&mut queue).await.is_none());

        orchestrator.in_progress.store(false, Ordering::SeqCst);
        assert!(orchestrator.trigger_manual(&mut queue).await.is_ok());
    }

    #[tokio::test]
    async fn skip_messages_are_user_facing() {
        assert!(SyncSkip::Offline.to_string().contains("offline"));
        assert!(SyncSkip::AlreadyRunning.to_string().contains("please wait"));
    }
}
