pub mod allocator;
pub mod directory;
pub mod ledger;
pub mod slots;
pub mod wizard;

pub use allocator::{DEFAULT_CANCELLATION_REASON, SlotAllocator};
pub use directory::DoctorDirectory;
pub use ledger::{BookingStore, InMemoryLedger};
pub use slots::{available_slots, booking_window, candidate_slots};
pub use wizard::{BookingWizard, WizardError, WizardStep};
