//! Step-by-step booking flow: department, doctor, date and time, details.
//!
//! Forward moves are refused until their precondition holds, so the wizard
//! can never sit on the date/time step without a doctor or on the details
//! step without a date and time.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use shared::types::{AppointmentType, Booking, BookingDetails, BookingError, SlotTime};

use crate::booking::allocator::SlotAllocator;
use crate::booking::directory::DoctorDirectory;
use crate::booking::ledger::BookingStore;
use crate::booking::slots::booking_window;

pub const NO_AVAILABILITY_HINT: &str =
    "No available slots for this date. Please select another date.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectingDepartment,
    SelectingDoctor,
    SelectingDateTime,
    ConfirmingDetails,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Unknown department: {0}")]
    UnknownDepartment(String),
    #[error("Doctor {0} is not in the selected department")]
    UnknownDoctor(i64),
    #[error("{0} is outside the booking window")]
    DateOutsideWindow(NaiveDate),
    #[error("{0} is not available")]
    SlotUnavailable(SlotTime),
    #[error("Please select a {0} first")]
    Incomplete(&'static str),
    #[error("Not allowed while {0:?}")]
    InvalidTransition(WizardStep),
    #[error(transparent)]
    Booking(#[from] BookingError),
}

/// One booking attempt for one patient.
#[derive(Debug)]
pub struct BookingWizard<'a, B> {
    allocator: &'a SlotAllocator<B>,
    directory: &'a DoctorDirectory,
    patient_id: i64,
    window: Vec<NaiveDate>,
    step: WizardStep,
    department: Option<String>,
    doctor_id: Option<i64>,
    date: Option<NaiveDate>,
    time: Option<SlotTime>,
    available: Vec<SlotTime>,
    booking: Option<Booking>,
}

impl<'a, B: BookingStore> BookingWizard<'a, B> {
    pub fn new(
        allocator: &'a SlotAllocator<B>,
        directory: &'a DoctorDirectory,
        patient_id: i64,
        today: NaiveDate,
        window_days: u32,
    ) -> Self {
        Self {
            allocator,
            directory,
            patient_id,
            window: booking_window(today, window_days),
            step: WizardStep::SelectingDepartment,
            department: None,
            doctor_id: None,
            date: None,
            time: None,
            available: Vec::new(),
            booking: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn doctor_id(&self) -> Option<i64> {
        self.doctor_id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<SlotTime> {
        self.time
    }

    pub fn window(&self) -> &[NaiveDate] {
        &self.window
    }

    pub fn available_slots(&self) -> &[SlotTime] {
        &self.available
    }

    pub fn booking(&self) -> Option<&Booking> {
        self.booking.as_ref()
    }

    /// Shown when a date is picked but nothing is free on it.
    pub fn availability_hint(&self) -> Option<&'static str> {
        (self.date.is_some() && self.available.is_empty()).then_some(NO_AVAILABILITY_HINT)
    }

    /// Whether the forward control on the current step is enabled.
    pub fn can_proceed(&self) -> bool {
        match self.step {
            WizardStep::SelectingDepartment => self.department.is_some(),
            WizardStep::SelectingDoctor => self.doctor_id.is_some(),
            WizardStep::SelectingDateTime => self.date.is_some() && self.time.is_some(),
            WizardStep::ConfirmingDetails | WizardStep::Submitted => false,
        }
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.step == WizardStep::Submitted {
            return Err(WizardError::InvalidTransition(self.step));
        }
        Ok(())
    }

    /// Choose a department. Any previously chosen doctor, date and time are
    /// dropped.
    pub fn select_department(&mut self, department: &str) -> Result<(), WizardError> {
        self.ensure_open()?;
        if !self.directory.has_department(department) {
            return Err(WizardError::UnknownDepartment(department.to_string()));
        }
        self.department = Some(department.to_string());
        self.doctor_id = None;
        self.date = None;
        self.time = None;
        self.available.clear();
        self.step = WizardStep::SelectingDoctor;
        debug!("Wizard department: {}", department);
        Ok(())
    }

    /// Choose a doctor from the selected department.
    pub async fn select_doctor(&mut self, doctor_id: i64) -> Result<(), WizardError> {
        self.ensure_open()?;
        let department = self
            .department
            .as_deref()
            .ok_or(WizardError::Incomplete("department"))?;
        if !self
            .directory
            .doctor(doctor_id)
            .is_some_and(|d| d.department == department)
        {
            return Err(WizardError::UnknownDoctor(doctor_id));
        }

        self.doctor_id = Some(doctor_id);
        self.time = None;
        self.step = WizardStep::SelectingDateTime;
        self.refresh_slots().await?;
        debug!("Wizard doctor: {}", doctor_id);
        Ok(())
    }

    /// Choose a date inside the booking window and load its free slots.
    pub async fn select_date(&mut self, date: NaiveDate) -> Result<&[SlotTime], WizardError> {
        self.require_step(WizardStep::SelectingDateTime)?;
        if !self.window.contains(&date) {
            return Err(WizardError::DateOutsideWindow(date));
        }
        self.date = Some(date);
        self.time = None;
        self.refresh_slots().await?;
        Ok(self.available.as_slice())
    }

    /// Choose one of the currently available slots.
    pub fn select_time(&mut self, time: SlotTime) -> Result<(), WizardError> {
        self.require_step(WizardStep::SelectingDateTime)?;
        if !self.available.contains(&time) {
            return Err(WizardError::SlotUnavailable(time));
        }
        self.time = Some(time);
        Ok(())
    }

    /// Move from date/time selection to the details step.
    pub fn proceed(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::SelectingDateTime)?;
        if self.date.is_none() {
            return Err(WizardError::Incomplete("date"));
        }
        if self.time.is_none() {
            return Err(WizardError::Incomplete("time"));
        }
        self.step = WizardStep::ConfirmingDetails;
        Ok(())
    }

    /// Step back one stage. Selections are kept.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.step = match self.step {
            WizardStep::Submitted => return Err(WizardError::InvalidTransition(self.step)),
            WizardStep::SelectingDepartment | WizardStep::SelectingDoctor => {
                WizardStep::SelectingDepartment
            }
            WizardStep::SelectingDateTime => WizardStep::SelectingDoctor,
            WizardStep::ConfirmingDetails => WizardStep::SelectingDateTime,
        };
        Ok(self.step)
    }

    /// Commit the booking. A lost race sends the wizard back to date/time
    /// selection with fresh slots.
    pub async fn submit(
        &mut self,
        appointment_type: AppointmentType,
        reason: &str,
    ) -> Result<&Booking, WizardError> {
        self.require_step(WizardStep::ConfirmingDetails)?;
        let (Some(doctor_id), Some(date), Some(time)) = (self.doctor_id, self.date, self.time)
        else {
            return Err(WizardError::Incomplete("date and time"));
        };
        if reason.trim().is_empty() {
            return Err(BookingError::MissingField("reason".to_string()).into());
        }

        let details = BookingDetails {
            patient_id: self.patient_id,
            appointment_type,
            reason: reason.to_string(),
        };
        match self
            .allocator
            .commit_booking(doctor_id, date, time, details)
            .await
        {
            Ok(booking) => {
                info!("Wizard submitted booking {}", booking.id);
                self.step = WizardStep::Submitted;
                Ok(&*self.booking.insert(booking))
            }
            Err(e) if e.is_recoverable() => {
                warn!("Wizard sending patient back to re-select: {}", e);
                self.step = WizardStep::SelectingDateTime;
                self.time = None;
                self.refresh_slots().await?;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn require_step(&self, step: WizardStep) -> Result<(), WizardError> {
        if self.step != step {
            return Err(WizardError::InvalidTransition(self.step));
        }
        Ok(())
    }

    async fn refresh_slots(&mut self) -> Result<(), BookingError> {
        self.available = match (self.doctor_id, self.date) {
            (Some(doctor_id), Some(date)) => {
                self.allocator.available_slots(doctor_id, date).await?
            }
            _ => Vec::new(),
        };
        Ok(())
    }
}
