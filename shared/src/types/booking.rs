use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Slot time
// ---------------------------------------------------------------------------

const SLOT_LABEL_FORMAT: &str = "%I:%M %p";

/// A bookable start time, rendered and parsed as `hh:mm AM|PM`.
///
/// Ordering is chronological within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    /// `None` when the hour/minute pair is not a valid time of day.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn label(&self) -> String {
        self.0.format(SLOT_LABEL_FORMAT).to_string()
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_LABEL_FORMAT))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid slot time: {0}")]
pub struct InvalidSlotTime(pub String);

impl FromStr for SlotTime {
    type Err = InvalidSlotTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), SLOT_LABEL_FORMAT)
            .map(Self)
            .map_err(|_| InvalidSlotTime(s.to_string()))
    }
}

impl TryFrom<String> for SlotTime {
    type Error = InvalidSlotTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.label()
    }
}

// ---------------------------------------------------------------------------
// Booking wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    #[default]
    Consultation,
    FollowUp,
    Procedure,
    Checkup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Whether a booking in this status still holds its slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// What the patient fills in on the confirmation step.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingDetails {
    pub patient_id: i64,
    #[serde(default)]
    pub appointment_type: AppointmentType,
    pub reason: String,
}

/// A committed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Booking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={}, doctor_id={}, patient_id={}, date={}, time={}",
            self.id, self.doctor_id, self.patient_id, self.date, self.time
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookingResponse {
    Success { booking: Booking, message: String },
    Error { code: String, message: String },
}

// ---------------------------------------------------------------------------
// Booking errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("Sorry, this slot was just booked by another patient. Please select a different time.")]
    SlotAlreadyBooked,
    #[error("This time is not offered on the selected date")]
    SlotNotOffered,
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Booking not found")]
    BookingNotFound,
    #[error("Only upcoming bookings can be cancelled")]
    NotCancellable,
    #[error("Only upcoming bookings can be rescheduled")]
    NotReschedulable,
    #[error("Please select a date within the booking window")]
    DateOutOfWindow,
    #[error("An internal error occurred")]
    InternalError,
}

impl BookingError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::SlotAlreadyBooked => "SLOT_ALREADY_BOOKED",
            Self::SlotNotOffered => "SLOT_NOT_OFFERED",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::BookingNotFound => "BOOKING_NOT_FOUND",
            Self::NotCancellable => "NOT_CANCELLABLE",
            Self::NotReschedulable => "NOT_RESCHEDULABLE",
            Self::DateOutOfWindow => "DATE_OUT_OF_WINDOW",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        self.to_string()
    }

    /// Recoverable errors send the user back to re-select rather than abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SlotAlreadyBooked | Self::SlotNotOffered | Self::DateOutOfWindow
        )
    }

    pub fn to_response(&self) -> BookingResponse {
        BookingResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_labels_are_zero_padded_twelve_hour() {
        assert_eq!(SlotTime::from_hm(9, 0).unwrap().label(), "09:00 AM");
        assert_eq!(SlotTime::from_hm(13, 30).unwrap().label(), "01:30 PM");
        assert_eq!(SlotTime::from_hm(18, 0).unwrap().label(), "06:00 PM");
    }

    #[test]
    fn slot_labels_parse_back() {
        let t: SlotTime = "10:00 AM".parse().unwrap();
        assert_eq!(t, SlotTime::from_hm(10, 0).unwrap());
        let t: SlotTime = "03:30 PM".parse().unwrap();
        assert_eq!(t, SlotTime::from_hm(15, 30).unwrap());
    }

    #[test]
    fn slot_label_rejects_garbage() {
        assert!("25:00 AM".parse::<SlotTime>().is_err());
        assert!("noon".parse::<SlotTime>().is_err());
        assert!("".parse::<SlotTime>().is_err());
    }

    #[test]
    fn slot_times_order_chronologically() {
        let morning: SlotTime = "11:30 AM".parse().unwrap();
        let afternoon: SlotTime = "01:00 PM".parse().unwrap();
        assert!(morning < afternoon);
    }

    #[test]
    fn cancelled_bookings_release_their_slot() {
        assert!(BookingStatus::Upcoming.holds_slot());
        assert!(BookingStatus::Completed.holds_slot());
        assert!(!BookingStatus::Cancelled.holds_slot());
    }
}
