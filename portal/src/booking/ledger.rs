use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use shared::types::{Booking, BookingDetails, BookingError, BookingStatus, SlotTime};

/// Persistence seam for committed bookings.
pub trait BookingStore: Send + Sync {
    /// Times already held for `(doctor_id, date)`. Cancelled bookings do not
    /// hold their time.
    fn list_booked(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> impl Future<Output = Result<HashSet<SlotTime>, BookingError>> + Send;

    /// Insert a booking unless the triple is already held. The check and the
    /// insert are one atomic step.
    fn insert_if_absent(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: SlotTime,
        details: BookingDetails,
    ) -> impl Future<Output = Result<Booking, BookingError>> + Send;

    /// A patient's bookings, oldest appointment first.
    fn bookings_for_patient(
        &self,
        patient_id: i64,
        status: Option<BookingStatus>,
    ) -> impl Future<Output = Result<Vec<Booking>, BookingError>> + Send;

    /// Move an upcoming booking owned by `patient_id` to a new date and time.
    /// Releasing the old slot and holding the new one is one atomic step.
    fn reschedule(
        &self,
        patient_id: i64,
        booking_id: &str,
        date: NaiveDate,
        time: SlotTime,
    ) -> impl Future<Output = Result<Booking, BookingError>> + Send;

    /// Mark an upcoming booking owned by `patient_id` as cancelled.
    fn cancel(
        &self,
        patient_id: i64,
        booking_id: &str,
        reason: Option<String>,
    ) -> impl Future<Output = Result<Booking, BookingError>> + Send;
}

type SlotKey = (i64, NaiveDate, SlotTime);

#[derive(Debug, Default)]
struct LedgerInner {
    bookings: HashMap<String, Booking>,
    /// Triples currently held, mapped to the holding booking id.
    held: HashMap<SlotKey, String>,
}

impl LedgerInner {
    fn admit(&mut self, booking: Booking) {
        if booking.status.holds_slot() {
            self.held.insert(
                (booking.doctor_id, booking.date, booking.time),
                booking.id.clone(),
            );
        }
        self.bookings.insert(booking.id.clone(), booking);
    }
}

/// Process-local booking ledger. Clones share the same committed set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with existing bookings. A later booking for an
    /// already-held triple replaces the earlier hold.
    pub fn with_bookings(bookings: impl IntoIterator<Item = Booking>) -> Self {
        let mut inner = LedgerInner::default();
        for booking in bookings {
            inner.admit(booking);
        }
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Number of triples currently held.
    pub async fn held_count(&self) -> usize {
        self.inner.lock().await.held.len()
    }
}

impl BookingStore for InMemoryLedger {
    async fn list_booked(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<HashSet<SlotTime>, BookingError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .held
            .keys()
            .filter(|(d, day, _)| *d == doctor_id && *day == date)
            .map(|(_, _, time)| *time)
            .collect())
    }

    async fn insert_if_absent(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: SlotTime,
        details: BookingDetails,
    ) -> Result<Booking, BookingError> {
        let mut inner = self.inner.lock().await;
        if inner.held.contains_key(&(doctor_id, date, time)) {
            return Err(BookingError::SlotAlreadyBooked);
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            doctor_id,
            patient_id: details.patient_id,
            date,
            time,
            appointment_type: details.appointment_type,
            reason: details.reason,
            status: BookingStatus::Upcoming,
            cancellation_reason: None,
            created_at: Utc::now(),
        };
        inner.admit(booking.clone());
        Ok(booking)
    }

    async fn bookings_for_patient(
        &self,
        patient_id: i64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.patient_id == patient_id)
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| (a.date, a.time, &a.id).cmp(&(b.date, b.time, &b.id)));
        Ok(bookings)
    }

    async fn reschedule(
        &self,
        patient_id: i64,
        booking_id: &str,
        date: NaiveDate,
        time: SlotTime,
    ) -> Result<Booking, BookingError> {
        let mut inner = self.inner.lock().await;
        let (doctor_id, old_key) = match inner.bookings.get(booking_id) {
            Some(b) if b.patient_id == patient_id => {
                if b.status != BookingStatus::Upcoming {
                    return Err(BookingError::NotReschedulable);
                }
                (b.doctor_id, (b.doctor_id, b.date, b.time))
            }
            _ => return Err(BookingError::BookingNotFound),
        };

        let new_key = (doctor_id, date, time);
        if inner.held.get(&new_key).is_some_and(|id| id != booking_id) {
            return Err(BookingError::SlotAlreadyBooked);
        }

        if inner.held.get(&old_key).is_some_and(|id| id == booking_id) {
            inner.held.remove(&old_key);
        }
        inner.held.insert(new_key, booking_id.to_string());

        let booking = inner
            .bookings
            .get_mut(booking_id)
            .ok_or(BookingError::BookingNotFound)?;
        booking.date = date;
        booking.time = time;
        Ok(booking.clone())
    }

    async fn cancel(
        &self,
        patient_id: i64,
        booking_id: &str,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let mut inner = self.inner.lock().await;
        let booking = match inner.bookings.get_mut(booking_id) {
            Some(b) if b.patient_id == patient_id => b,
            _ => return Err(BookingError::BookingNotFound),
        };
        if booking.status != BookingStatus::Upcoming {
            return Err(BookingError::NotCancellable);
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancellation_reason = reason;
        let cancelled = booking.clone();

        let key = (cancelled.doctor_id, cancelled.date, cancelled.time);
        if inner.held.get(&key).is_some_and(|id| id == booking_id) {
            inner.held.remove(&key);
        }
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::AppointmentType;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
    }

    fn ten() -> SlotTime {
        SlotTime::from_hm(10, 0).unwrap()
    }

    fn details(patient_id: i64) -> BookingDetails {
        BookingDetails {
            patient_id,
            appointment_type: AppointmentType::Consultation,
            reason: "Chest pain".into(),
        }
    }

    #[tokio::test]
    async fn second_insert_of_same_triple_conflicts() {
        let ledger = InMemoryLedger::new();
        ledger.insert_if_absent(1, date(), ten(), details(3)).await.unwrap();
        let err = ledger
            .insert_if_absent(1, date(), ten(), details(4))
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::SlotAlreadyBooked);
        assert_eq!(ledger.held_count().await, 1);
    }

    #[tokio::test]
    async fn other_doctor_or_date_is_independent() {
        let ledger = InMemoryLedger::new();
        ledger.insert_if_absent(1, date(), ten(), details(3)).await.unwrap();
        ledger.insert_if_absent(2, date(), ten(), details(3)).await.unwrap();
        let next_day = date().succ_opt().unwrap();
        ledger.insert_if_absent(1, next_day, ten(), details(3)).await.unwrap();

        assert_eq!(ledger.list_booked(1, date()).await.unwrap().len(), 1);
        assert_eq!(ledger.held_count().await, 3);
    }

    #[tokio::test]
    async fn cancel_releases_slot_and_checks_owner() {
        let ledger = InMemoryLedger::new();
        let booking = ledger.insert_if_absent(1, date(), ten(), details(3)).await.unwrap();

        assert_eq!(
            ledger.cancel(4, &booking.id, None).await.unwrap_err(),
            BookingError::BookingNotFound
        );

        let cancelled = ledger
            .cancel(3, &booking.id, Some("Feeling better".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(ledger.list_booked(1, date()).await.unwrap().is_empty());

        assert_eq!(
            ledger.cancel(3, &booking.id, None).await.unwrap_err(),
            BookingError::NotCancellable
        );
    }

    #[tokio::test]
    async fn reschedule_moves_the_hold() {
        let ledger = InMemoryLedger::new();
        let booking = ledger.insert_if_absent(1, date(), ten(), details(3)).await.unwrap();
        let eleven = SlotTime::from_hm(11, 0).unwrap();

        let moved = ledger.reschedule(3, &booking.id, date(), eleven).await.unwrap();
        assert_eq!(moved.time, eleven);
        assert_eq!(moved.id, booking.id);

        let held = ledger.list_booked(1, date()).await.unwrap();
        assert!(held.contains(&eleven));
        assert!(!held.contains(&ten()));
        assert_eq!(ledger.held_count().await, 1);
    }

    #[tokio::test]
    async fn reschedule_onto_a_held_slot_conflicts() {
        let ledger = InMemoryLedger::new();
        let mine = ledger.insert_if_absent(1, date(), ten(), details(3)).await.unwrap();
        let eleven = SlotTime::from_hm(11, 0).unwrap();
        ledger.insert_if_absent(1, date(), eleven, details(4)).await.unwrap();

        assert_eq!(
            ledger.reschedule(3, &mine.id, date(), eleven).await.unwrap_err(),
            BookingError::SlotAlreadyBooked
        );
        assert_eq!(
            ledger.reschedule(4, &mine.id, date(), ten()).await.unwrap_err(),
            BookingError::BookingNotFound
        );
        // Original hold is untouched.
        assert!(ledger.list_booked(1, date()).await.unwrap().contains(&ten()));
        assert_eq!(ledger.held_count().await, 2);
    }

    #[tokio::test]
    async fn patient_bookings_are_filtered_and_ordered() {
        let ledger = InMemoryLedger::new();
        let later = ledger
            .insert_if_absent(1, date().succ_opt().unwrap(), ten(), details(3))
            .await
            .unwrap();
        let earlier = ledger.insert_if_absent(1, date(), ten(), details(3)).await.unwrap();
        ledger.insert_if_absent(2, date(), ten(), details(9)).await.unwrap();
        ledger.cancel(3, &later.id, None).await.unwrap();

        let all = ledger.bookings_for_patient(3, None).await.unwrap();
        assert_eq!(all.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec![
            earlier.id.as_str(),
            later.id.as_str()
        ]);

        let upcoming = ledger
            .bookings_for_patient(3, Some(BookingStatus::Upcoming))
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, earlier.id);
    }
}
