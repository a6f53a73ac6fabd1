//! # invitedesk-gateway
//!
//! Client for the remote store gateway of the invitedesk intake system.
//!
//! The backend is a serverless scripting endpoint in front of a tabular
//! store. Every call is an HTTP POST of a `{"function", "parameters"}`
//! envelope; responses are function-specific JSON bodies, with
//! `{"success": false, "message": ...}` for processed-but-rejected calls.
//!
//! This crate provides:
//! - [`GatewayClient`] — the reqwest-based client
//! - The camelCase wire types the backend speaks
//! - [`RemoteGateway`] — the trait consumed by the sync core, so the
//!   orchestration logic can be tested against a scripted gateway

mod client;
mod error;
mod types;

pub use client::GatewayClient;
pub use error::{Error, Result};
pub use types::{
    InvitationSubmission, ProbeResponse, RemoteUser, RpcEnvelope, SessionTotals, SubmitAck,
    SubmitResponse,
};

/// The gateway operations the sync core depends on.
///
/// [`GatewayClient`] is the production implementation; tests substitute a
/// scripted one. Dispatch is static (the core is generic over the
/// implementation), so plain `async fn` methods suffice.
#[allow(async_fn_in_trait)]
pub trait RemoteGateway {
    /// Submits one invitation record; the payload always carries the
    /// record's local id so the backend can deduplicate retries.
    async fn submit_invitation(&self, submission: &InvitationSubmission) -> Result<SubmitAck>;

    /// Fetches per-session quota limits for a staff member and day.
    async fn today_quota(&self, staff_name: &str, date: &str) -> Result<SessionTotals>;

    /// Fetches authoritative per-session invitation counts for an inviter
    /// and day.
    async fn today_invitations(&self, inviter: &str, date: &str) -> Result<SessionTotals>;

    /// Authenticates a staff member.
    async fn authenticate(&self, username: &str, password: &str) -> Result<RemoteUser>;

    /// Probes the backend for reachability.
    async fn probe(&self) -> Result<()>;
}

impl RemoteGateway for GatewayClient {
    async fn submit_invitation(&self, submission: &InvitationSubmission) -> Result<SubmitAck> {
        Self::submit_invitation(self, submission).await
    }

    async fn today_quota(&self, staff_name: &str, date: &str) -> Result<SessionTotals> {
        Self::today_quota(self, staff_name, date).await
    }

    async fn today_invitations(&self, inviter: &str, date: &str) -> Result<SessionTotals> {
        Self::today_invitations(self, inviter, date).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<RemoteUser> {
        Self::authenticate(self, username, password).await
    }

    async fn probe(&self) -> Result<()> {
        Self::probe(self).await
    }
}
