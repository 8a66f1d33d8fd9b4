pub mod booking;
pub mod credentials;
pub mod routing;
pub mod session;
