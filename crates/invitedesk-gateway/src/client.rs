//! HTTP client for the backend RPC endpoint.
//!
//! The backend exposes a single POST endpoint that dispatches on a
//! `{"function": ..., "parameters": ...}` envelope and answers with a
//! function-specific JSON body.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{
    AuthResponse, InvitationSubmission, ProbeResponse, RemoteUser, RpcEnvelope, SessionTotals,
    SubmitAck, SubmitResponse,
};

/// Client for the remote store gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    /// RPC endpoint URL.
    endpoint: Url,
    /// Shared HTTP client.
    http_client: Client,
}

impl GatewayClient {
    /// Creates a new client for the given endpoint.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            http_client: Client::new(),
        }
    }

    /// Creates a new client, parsing the endpoint from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL.
    pub fn for_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self::new(endpoint.parse()?))
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts one RPC envelope and decodes the response body.
    async fn call<P, R>(&self, function: &'static str, parameters: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        debug!(function, "calling gateway");

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&RpcEnvelope {
                function,
                parameters,
            })
            .send()
            .await?
            .error_for_status()?;

        response.json().await.map_err(Into::into)
    }

    /// Submits one invitation record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] when the backend refuses the record
    /// (validation or authoritative quota check), [`Error::Http`] on
    /// transport failure.
    pub async fn submit_invitation(&self, submission: &InvitationSubmission) -> Result<SubmitAck> {
        let response: SubmitResponse = self.call("submitInvitation", submission).await?;

        if !response.success {
            return Err(Error::rejected(
                response
                    .message
                    .unwrap_or_else(|| "submission rejected".to_string()),
            ));
        }

        let invitation_id = response.invitation_id.ok_or_else(|| {
            Error::InvalidResponse("accepted submission carried no invitationId".to_string())
        })?;

        Ok(SubmitAck {
            invitation_id,
            updated_counts: response.updated_counts,
        })
    }

    /// Fetches the per-session quota limits for a staff member and day.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an undecodable body.
    pub async fn today_quota(&self, staff_name: &str, date: &str) -> Result<SessionTotals> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Params<'a> {
            staff_name: &'a str,
            date: &'a str,
        }

        self.call("getTodayQuota", Params { staff_name, date })
            .await
    }

    /// Fetches the authoritative per-session invitation counts for an
    /// inviter and day.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an undecodable body.
    pub async fn today_invitations(&self, inviter: &str, date: &str) -> Result<SessionTotals> {
        #[derive(Serialize)]
        struct Params<'a> {
            inviter: &'a str,
            date: &'a str,
        }

        self.call("getTodayInvitations", Params { inviter, date })
            .await
    }

    /// Authenticates a staff member against the backend's account store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] on bad credentials, [`Error::Http`] on
    /// transport failure.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<RemoteUser> {
        #[derive(Serialize)]
        struct Params<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response: AuthResponse = self
            .call("authenticateUser", Params { username, password })
            .await?;

        if !response.success {
            return Err(Error::rejected(
                response
                    .message
                    .unwrap_or_else(|| "authentication failed".to_string()),
            ));
        }

        response.user.ok_or_else(|| {
            Error::InvalidResponse("successful authentication carried no user".to_string())
        })
    }

    /// Probes the backend for reachability.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unreachable or reports itself
    /// unhealthy.
    pub async fn probe(&self) -> Result<()> {
        #[derive(Serialize)]
        struct Params {}

        let response: ProbeResponse = self.call("testConnection", Params {}).await?;

        if response.success {
            Ok(())
        } else {
            Err(Error::rejected(
                response
                    .message
                    .unwrap_or_else(|| "backend reported unhealthy".to_string()),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn client_parses_endpoint() {
        let client = GatewayClient::for_endpoint("https://example.com/exec").unwrap();
        assert_eq!(client.endpoint().as_str(), "https://example.com/exec");
    }

    #[test]
    fn client_rejects_invalid_endpoint() {
        assert!(GatewayClient::for_endpoint("not a url").is_err());
    }
}
