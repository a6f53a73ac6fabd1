//! Wire types for the backend's RPC envelope.
//!
//! Field names are camelCase on the wire to match the backend's JSON
//! contract exactly (`localId`, `sessionInfo`, `staffName`, ...).

use serde::{Deserialize, Serialize};

/// The request envelope every backend call is wrapped in.
#[derive(Debug, Serialize)]
pub struct RpcEnvelope<P> {
    /// Backend function name to dispatch to.
    pub function: &'static str,
    /// Function-specific parameters object.
    pub parameters: P,
}

/// One invitation record as submitted to the backend.
///
/// Always carries `local_id`: the backend uses it as the natural
/// deduplication key, so resubmitting a previously failed record cannot
/// create a duplicate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationSubmission {
    /// Client-generated record identifier (dedup key).
    pub local_id: String,
    /// Participant name.
    pub name: String,
    /// Primary phone number.
    pub phone1: String,
    /// Secondary phone number.
    pub phone2: String,
    /// Mammography screening selected.
    pub mammography: bool,
    /// First-time screening selected.
    pub first_screen: bool,
    /// Cervical smear screening selected.
    pub cervical_smear: bool,
    /// Adult health check selected.
    pub adult_health: bool,
    /// Hepatitis B/C screening selected.
    pub hepatitis: bool,
    /// Colorectal screening selected.
    pub colorectal: bool,
    /// Free-text notes.
    pub notes: String,
    /// Raw session descriptor (`date-region-location-appointmentType`).
    pub session_info: String,
    /// Session label (morning/afternoon/evening).
    pub session: String,
    /// Staff identity making the invitation.
    pub inviter: String,
}

/// Per-session-bucket totals, returned by the quota and count calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Morning bucket.
    pub morning: u32,
    /// Afternoon bucket.
    pub afternoon: u32,
    /// Evening bucket.
    pub evening: u32,
    /// Sum of the three buckets.
    pub total: u32,
}

/// Backend response to `submitInvitation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Whether the record was accepted.
    pub success: bool,
    /// Server-assigned record identifier (present on success).
    #[serde(default)]
    pub invitation_id: Option<String>,
    /// Rejection or status message.
    #[serde(default)]
    pub message: Option<String>,
    /// Authoritative counts after the accepted submission.
    #[serde(default)]
    pub updated_counts: Option<SessionTotals>,
}

/// Acknowledgement for an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmitAck {
    /// Server-assigned record identifier.
    pub invitation_id: String,
    /// Authoritative counts after the submission, if the backend sent them.
    pub updated_counts: Option<SessionTotals>,
}

/// Authenticated staff identity as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Staff display name.
    pub name: String,
    /// Role string (`"staff"` or `"admin"`).
    #[serde(default)]
    pub role: Option<String>,
}

/// Backend response to `authenticateUser`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Whether the credentials were accepted.
    pub success: bool,
    /// The authenticated user (present on success).
    #[serde(default)]
    pub user: Option<RemoteUser>,
    /// Failure message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend response to `testConnection`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeResponse {
    /// Whether the backend considers itself reachable and healthy.
    pub success: bool,
    /// Status message.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn submission_serializes_camel_case() {
        let submission = InvitationSubmission {
            local_id: "inv-1700000000000-a1b2c3d4".to_string(),
            name: "Lin Mei".to_string(),
            phone1: "0912345678".to_string(),
            phone2: String::new(),
            mammography: true,
            first_screen: false,
            cervical_smear: false,
            adult_health: true,
            hepatitis: false,
            colorectal: false,
            notes: String::new(),
            session_info: "20260301-North-Clinic A-primary".to_string(),
            session: "morning".to_string(),
            inviter: "chen".to_string(),
        };

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["localId"], "inv-1700000000000-a1b2c3d4");
        assert_eq!(json["sessionInfo"], "20260301-North-Clinic A-primary");
        assert_eq!(json["firstScreen"], false);
        assert_eq!(json["adultHealth"], true);
        assert!(json.get("local_id").is_none());
    }

    #[test]
    fn submit_response_deserializes_success() {
        let json = r#"{
            "success": true,
            "message": "saved",
            "invitationId": "INV1700000000000abc",
            "updatedCounts": {"morning": 3, "afternoon": 0, "evening": 1, "total": 4}
        }"#;

        let response: SubmitResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(
            response.invitation_id.as_deref(),
            Some("INV1700000000000abc")
        );
        assert_eq!(response.updated_counts.unwrap().morning, 3);
    }

    #[test]
    fn submit_response_deserializes_rejection_without_id() {
        let json = r#"{"success": false, "message": "morning quota reached (3/3)"}"#;
        let response: SubmitResponse = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        assert!(response.invitation_id.is_none());
        assert_eq!(response.message.as_deref(), Some("morning quota reached (3/3)"));
    }

    #[test]
    fn session_totals_deserialize_bare_object() {
        // Quota and count calls return the totals object directly,
        // with no success envelope.
        let json = r#"{"morning": 2, "afternoon": 5, "evening": 0, "total": 7}"#;
        let totals: SessionTotals = serde_json::from_str(json).unwrap();
        assert_eq!(totals.morning, 2);
        assert_eq!(totals.total, 7);
    }

    #[test]
    fn auth_response_defaults_missing_role() {
        let json = r#"{"success": true, "user": {"name": "chen"}}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let user = response.user.unwrap();
        assert_eq!(user.name, "chen");
        assert!(user.role.is_none());
    }
}
