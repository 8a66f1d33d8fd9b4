pub mod booking;
pub mod identity;
pub mod jwt;
pub mod login;
pub mod portal_config;
pub mod register;

pub use self::booking::{
    AppointmentType, Booking, BookingDetails, BookingError, BookingResponse, BookingStatus,
    SlotTime,
};
pub use self::identity::{Identity, ProfileAttributes, Role, UnknownRole};
pub use self::jwt::SessionClaims;
pub use self::login::{LoginData, LoginError, LoginResponse, LogoutResponse};
pub use self::register::{RegistrationData, RegistrationError, RegistrationResponse};
