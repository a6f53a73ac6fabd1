//! Session-capacity quota evaluation.
//!
//! Quotas constrain primary bookings only, per inviter, per day, per
//! session bucket. The same evaluation runs twice for every submission:
//! optimistically on the client against locally derived counts and cached
//! limits, and authoritatively inside the backend's submission handler.
//! The client-side result is advisory; the backend's is binding.

use serde::{Deserialize, Serialize};

use crate::session::AppointmentType;
use invitedesk_gateway::SessionTotals;

/// One of the three daily session buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBucket {
    /// Morning session.
    Morning,
    /// Afternoon session.
    Afternoon,
    /// Evening session.
    Evening,
}

impl SessionBucket {
    /// Maps a session label onto its bucket.
    ///
    /// Unknown labels return `None` and are treated as unconstrained,
    /// matching the backend's handling of sessions outside the three
    /// standard buckets.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }

    /// Canonical label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

/// Per-bucket daily capacity for one inviter.
///
/// A capacity of 0 means the bucket is not offered today at all — a hard
/// block distinct from "capacity reached".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    /// Morning capacity.
    pub morning: u32,
    /// Afternoon capacity.
    pub afternoon: u32,
    /// Evening capacity.
    pub evening: u32,
}

impl QuotaLimits {
    /// Capacity of one bucket.
    #[must_use]
    pub const fn get(&self, bucket: SessionBucket) -> u32 {
        match bucket {
            SessionBucket::Morning => self.morning,
            SessionBucket::Afternoon => self.afternoon,
            SessionBucket::Evening => self.evening,
        }
    }

    /// Sum of the three bucket capacities.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.morning + self.afternoon + self.evening
    }
}

impl From<SessionTotals> for QuotaLimits {
    fn from(totals: SessionTotals) -> Self {
        Self {
            morning: totals.morning,
            afternoon: totals.afternoon,
            evening: totals.evening,
        }
    }
}

/// Derived per-bucket counts of quota-relevant records.
///
/// Never stored: recomputed from the live queue on demand, so it cannot
/// drift from the records it summarizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvitationCounts {
    /// Morning count.
    pub morning: u32,
    /// Afternoon count.
    pub afternoon: u32,
    /// Evening count.
    pub evening: u32,
}

impl InvitationCounts {
    /// Count in one bucket.
    #[must_use]
    pub const fn get(&self, bucket: SessionBucket) -> u32 {
        match bucket {
            SessionBucket::Morning => self.morning,
            SessionBucket::Afternoon => self.afternoon,
            SessionBucket::Evening => self.evening,
        }
    }

    /// Increments one bucket.
    pub const fn bump(&mut self, bucket: SessionBucket) {
        match bucket {
            SessionBucket::Morning => self.morning += 1,
            SessionBucket::Afternoon => self.afternoon += 1,
            SessionBucket::Evening => self.evening += 1,
        }
    }

    /// Sum of the three buckets.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.morning + self.afternoon + self.evening
    }
}

/// Outcome of one quota evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Submission may proceed.
    Allowed,
    /// The bucket is not offered today (capacity configured as 0).
    ZeroQuota {
        /// Session label the submission targeted.
        session: String,
    },
    /// The bucket's capacity is already consumed.
    QuotaReached {
        /// Session label the submission targeted.
        session: String,
        /// Current count in the bucket.
        count: u32,
        /// Configured capacity of the bucket.
        limit: u32,
    },
}

impl QuotaDecision {
    /// Returns true when the submission may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl std::fmt::Display for QuotaDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::ZeroQuota { session } => write!(
                f,
                "{session} is not accepting primary invitations today (zero quota)"
            ),
            Self::QuotaReached {
                session,
                count,
                limit,
            } => write!(f, "{session} primary quota reached ({count}/{limit})"),
        }
    }
}

/// Evaluates whether a submission fits the quota.
///
/// Non-primary bookings and sessions outside the three standard buckets
/// are always allowed. For primary bookings the zero-quota hard block is
/// checked before the capacity comparison, so "not offered today" and
/// "full" stay distinguishable to the user.
#[must_use]
pub fn evaluate(
    session: &str,
    appointment_type: AppointmentType,
    counts: &InvitationCounts,
    limits: &QuotaLimits,
) -> QuotaDecision {
    if !appointment_type.is_primary() {
        return QuotaDecision::Allowed;
    }

    let Some(bucket) = SessionBucket::from_label(session) else {
        return QuotaDecision::Allowed;
    };

    let limit = limits.get(bucket);
    if limit == 0 {
        return QuotaDecision::ZeroQuota {
            session: session.to_string(),
        };
    }

    let count = counts.get(bucket);
    if count >= limit {
        return QuotaDecision::QuotaReached {
            session: session.to_string(),
            count,
            limit,
        };
    }

    QuotaDecision::Allowed
}
