//! Invitation data models.

use chrono::{DateTime, FixedOffset};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::session::{AppointmentType, SessionDescriptor};
use invitedesk_gateway::InvitationSubmission;

/// Client-generated record identifier.
///
/// Unique, never reassigned; the sole stable key across offline edits and
/// the backend's deduplication key for retried submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(pub String);

impl LocalId {
    /// Generates a fresh identifier from the creation instant plus a
    /// random suffix.
    #[must_use]
    pub fn generate(now: DateTime<FixedOffset>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        Self(format!(
            "inv-{}-{}",
            now.timestamp_millis(),
            suffix.to_ascii_lowercase()
        ))
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-record synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Captured locally, not yet submitted.
    Pending,
    /// Currently part of a sync run.
    Syncing,
    /// Accepted by the remote store.
    Synced,
    /// Last submission attempt failed; retried on the next run.
    Error,
}

impl SyncStatus {
    /// Returns true for records a sync run should pick up.
    #[must_use]
    pub const fn is_sync_candidate(self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }

    /// Returns true for records that occupy a quota slot.
    ///
    /// Error records are excluded: a rejected record must free the slot
    /// it failed to claim.
    #[must_use]
    pub const fn counts_toward_quota(self) -> bool {
        matches!(self, Self::Pending | Self::Syncing | Self::Synced)
    }

    /// Display label.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

/// The six screening selections captured per participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningSelections {
    /// Mammography.
    pub mammography: bool,
    /// First-time screening.
    pub first_screen: bool,
    /// Cervical smear.
    pub cervical_smear: bool,
    /// Adult health check.
    pub adult_health: bool,
    /// Hepatitis B/C.
    pub hepatitis: bool,
    /// Colorectal.
    pub colorectal: bool,
}

/// One registration attempt for one participant in one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationRecord {
    /// Client-generated identifier; primary key for local operations.
    pub local_id: LocalId,
    /// Server-assigned identifier once the remote store accepts.
    pub server_id: Option<String>,
    /// Synchronization state.
    pub sync_status: SyncStatus,
    /// Failure message from the last submission attempt, when status is
    /// [`SyncStatus::Error`].
    pub sync_error: Option<String>,
    /// Creation instant, canonical zone.
    pub create_time: DateTime<FixedOffset>,
    /// Last local edit, canonical zone.
    pub last_modified: DateTime<FixedOffset>,
    /// Participant name.
    pub name: String,
    /// Primary phone number.
    pub phone1: String,
    /// Secondary phone number.
    pub phone2: String,
    /// Screening selections.
    pub screening: ScreeningSelections,
    /// Free-text notes.
    pub notes: String,
    /// Raw session descriptor, kept verbatim for resubmission.
    pub session_info: String,
    /// Session date, `MMDD`.
    pub date: String,
    /// Four-digit year captured at creation.
    pub year: String,
    /// Session region.
    pub region: String,
    /// Session venue.
    pub location: String,
    /// Session label (morning/afternoon/evening).
    pub session: String,
    /// Booking type derived from the descriptor.
    pub appointment_type: AppointmentType,
    /// Staff identity the record was captured under.
    pub inviter: String,
    /// Day key (`MMDD`) of the canonical "today" at creation; the quota
    /// bucketing dimension. Never recomputed on edit.
    pub invite_date: String,
}

impl InvitationRecord {
    /// Builds the wire payload for one submission attempt.
    #[must_use]
    pub fn to_submission(&self) -> InvitationSubmission {
        InvitationSubmission {
            local_id: self.local_id.0.clone(),
            name: self.name.clone(),
            phone1: self.phone1.clone(),
            phone2: self.phone2.clone(),
            mammography: self.screening.mammography,
            first_screen: self.screening.first_screen,
            cervical_smear: self.screening.cervical_smear,
            adult_health: self.screening.adult_health,
            hepatitis: self.screening.hepatitis,
            colorectal: self.screening.colorectal,
            notes: self.notes.clone(),
            session_info: self.session_info.clone(),
            session: self.session.clone(),
            inviter: self.inviter.clone(),
        }
    }

    /// Applies a freshly parsed descriptor to the derived session fields.
    pub(crate) fn apply_descriptor(&mut self, raw: &str, descriptor: &SessionDescriptor) {
        self.session_info = raw.to_string();
        self.date = descriptor.short_date().to_string();
        self.region = descriptor.region.clone();
        self.location = descriptor.location.clone();
        self.appointment_type = descriptor.appointment_type;
    }
}

/// Input for creating an invitation record.
#[derive(Debug, Clone, Default)]
pub struct InvitationInput {
    /// Participant name (required).
    pub name: String,
    /// Primary phone number (required).
    pub phone1: String,
    /// Secondary phone number.
    pub phone2: String,
    /// Screening selections.
    pub screening: ScreeningSelections,
    /// Free-text notes.
    pub notes: String,
    /// Session label (required).
    pub session: String,
    /// Raw session descriptor (required).
    pub session_info: String,
}

impl InvitationInput {
    /// Validates required fields and parses the session descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first missing-field error, or a descriptor parse
    /// failure. Nothing is queued when validation fails.
    pub fn validate(&self) -> Result<SessionDescriptor, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.phone1.trim().is_empty() {
            return Err(ValidationError::MissingPrimaryPhone);
        }
        if self.session.trim().is_empty() {
            return Err(ValidationError::MissingSession);
        }
        SessionDescriptor::parse(&self.session_info)
    }
}

/// Partial update for an existing record.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct InvitationPatch {
    /// New participant name.
    pub name: Option<String>,
    /// New primary phone number.
    pub phone1: Option<String>,
    /// New secondary phone number.
    pub phone2: Option<String>,
    /// New screening selections.
    pub screening: Option<ScreeningSelections>,
    /// New notes.
    pub notes: Option<String>,
    /// New session label.
    pub session: Option<String>,
    /// New session descriptor; re-derives the session fields.
    pub session_info: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        "2026-03-01T09:00:00+08:00".parse().unwrap()
    }

    #[test]
    fn local_ids_are_unique() {
        let a = LocalId::generate(now());
        let b = LocalId::generate(now());
        assert_ne!(a, b);
        assert!(a.0.starts_with("inv-"));
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut input = InvitationInput {
            name: "Lin Mei".to_string(),
            phone1: "0912345678".to_string(),
            session: "morning".to_string(),
            session_info: "20260301-North-Clinic A-primary".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        input.phone1 = "  ".to_string();
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingPrimaryPhone)
        );
    }

    #[test]
    fn status_classification() {
        assert!(SyncStatus::Pending.is_sync_candidate());
        assert!(SyncStatus::Error.is_sync_candidate());
        assert!(!SyncStatus::Synced.is_sync_candidate());
        assert!(!SyncStatus::Error.counts_toward_quota());
        assert!(SyncStatus::Syncing.counts_toward_quota());
    }
}
