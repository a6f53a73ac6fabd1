//! Session descriptor parsing.
//!
//! The session-selection collaborator hands the client a composite key of
//! the form `date-region-location-appointmentType` (hyphen-joined,
//! `YYYYMMDD` date). The fourth segment may be absent, in which case the
//! appointment is a secondary booking.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Booking type of an appointment session.
///
/// Only primary appointments are subject to quota enforcement; every
/// other booking is an unconstrained secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentType {
    /// Quota-limited booking.
    Primary,
    /// Unconstrained booking.
    #[default]
    Secondary,
}

impl AppointmentType {
    /// Parses a descriptor segment; anything other than `primary` is a
    /// secondary booking.
    #[must_use]
    pub fn from_segment(segment: &str) -> Self {
        if segment.trim().eq_ignore_ascii_case("primary") {
            Self::Primary
        } else {
            Self::Secondary
        }
    }

    /// Returns true for the quota-limited type.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Primary)
    }

    /// Descriptor segment / display form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed session descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    /// Session date, `YYYYMMDD`.
    pub date: String,
    /// Region the session is held in.
    pub region: String,
    /// Venue within the region.
    pub location: String,
    /// Booking type of the session.
    pub appointment_type: AppointmentType,
}

impl SessionDescriptor {
    /// Parses a `date-region-location-appointmentType` descriptor.
    ///
    /// A missing fourth segment defaults to [`AppointmentType::Secondary`];
    /// segments beyond the fourth are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingSessionDescriptor`] for an empty
    /// input and [`ValidationError::MalformedSessionDescriptor`] when
    /// fewer than three segments are present.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::MissingSessionDescriptor);
        }

        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() < 3 {
            return Err(ValidationError::MalformedSessionDescriptor);
        }

        let appointment_type = parts
            .get(3)
            .map_or(AppointmentType::Secondary, |segment| {
                AppointmentType::from_segment(segment)
            });

        Ok(Self {
            date: parts[0].to_string(),
            region: parts[1].to_string(),
            location: parts[2].to_string(),
            appointment_type,
        })
    }

    /// The session date in the short `MMDD` form stored on records.
    #[must_use]
    pub fn short_date(&self) -> &str {
        crate::time::short_day_key(&self.date)
    }
}
