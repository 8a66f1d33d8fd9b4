use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared::types::{Booking, BookingDetails, BookingError, BookingStatus, SlotTime};

use crate::booking::ledger::BookingStore;
use crate::booking::slots::{available_slots, booking_window, candidate_slots};

/// Recorded when a patient cancels without giving a reason.
pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelled by patient";

const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Computes bookable times and commits bookings against a [`BookingStore`].
#[derive(Debug, Clone)]
pub struct SlotAllocator<B> {
    store: B,
    /// Days after today open for rescheduling.
    window_days: u32,
}

impl<B: BookingStore> SlotAllocator<B> {
    pub fn new(store: B) -> Self {
        Self {
            store,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    /// Candidate slots for the date minus those already held.
    pub async fn available_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SlotTime>, BookingError> {
        let booked = self.store.list_booked(doctor_id, date).await?;
        let available = available_slots(candidate_slots(doctor_id, date), &booked);
        debug!(
            "doctor_id={}, date={}: {} available, {} booked",
            doctor_id,
            date,
            available.len(),
            booked.len()
        );
        Ok(available)
    }

    /// Commit `(doctor_id, date, time)` for a patient.
    ///
    /// The held set is re-read right before the insert, and the insert is
    /// itself conditional, so a slot that was free when the patient looked
    /// but taken since comes back as [`BookingError::SlotAlreadyBooked`].
    pub async fn commit_booking(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: SlotTime,
        details: BookingDetails,
    ) -> Result<Booking, BookingError> {
        if details.reason.trim().is_empty() {
            return Err(BookingError::MissingField("reason".to_string()));
        }
        if !candidate_slots(doctor_id, date).contains(&time) {
            warn!("Rejected booking for unoffered slot {} on {}", time, date);
            return Err(BookingError::SlotNotOffered);
        }

        let booked = self.store.list_booked(doctor_id, date).await?;
        if booked.contains(&time) {
            warn!(
                "Slot conflict on re-check: doctor_id={}, date={}, time={}",
                doctor_id, date, time
            );
            return Err(BookingError::SlotAlreadyBooked);
        }

        let details = BookingDetails {
            reason: details.reason.trim().to_string(),
            ..details
        };
        match self.store.insert_if_absent(doctor_id, date, time, details).await {
            Ok(booking) => {
                info!("Booking committed: {}", booking);
                Ok(booking)
            }
            Err(e) => {
                if e == BookingError::SlotAlreadyBooked {
                    warn!(
                        "Slot taken between re-check and insert: doctor_id={}, date={}, time={}",
                        doctor_id, date, time
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn bookings_for_patient(
        &self,
        patient_id: i64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        self.store.bookings_for_patient(patient_id, status).await
    }

    /// Move an upcoming booking to another offered, free slot inside the
    /// booking window that starts after `today`. The doctor stays the same.
    pub async fn reschedule_booking(
        &self,
        patient_id: i64,
        booking_id: &str,
        date: NaiveDate,
        time: SlotTime,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        if !booking_window(today, self.window_days).contains(&date) {
            return Err(BookingError::DateOutOfWindow);
        }

        let current = self
            .store
            .bookings_for_patient(patient_id, None)
            .await?
            .into_iter()
            .find(|b| b.id == booking_id)
            .ok_or(BookingError::BookingNotFound)?;
        if current.status != BookingStatus::Upcoming {
            return Err(BookingError::NotReschedulable);
        }
        let doctor_id = current.doctor_id;

        if !candidate_slots(doctor_id, date).contains(&time) {
            warn!("Rejected reschedule onto unoffered slot {} on {}", time, date);
            return Err(BookingError::SlotNotOffered);
        }

        let booked = self.store.list_booked(doctor_id, date).await?;
        let own_slot = current.date == date && current.time == time;
        if booked.contains(&time) && !own_slot {
            warn!(
                "Slot conflict on reschedule re-check: doctor_id={}, date={}, time={}",
                doctor_id, date, time
            );
            return Err(BookingError::SlotAlreadyBooked);
        }

        let moved = self
            .store
            .reschedule(patient_id, booking_id, date, time)
            .await?;
        info!("Booking rescheduled: {}", moved);
        Ok(moved)
    }

    /// Cancel an upcoming booking; its slot becomes available again. A
    /// missing or blank reason is recorded as [`DEFAULT_CANCELLATION_REASON`].
    pub async fn cancel_booking(
        &self,
        patient_id: i64,
        booking_id: &str,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string());
        let cancelled = self
            .store
            .cancel(patient_id, booking_id, Some(reason))
            .await?;
        info!("Booking cancelled: {}", cancelled);
        Ok(cancelled)
    }
}
