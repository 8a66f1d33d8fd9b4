pub mod directory;
pub mod password;

pub use directory::{AccountDirectory, CredentialSource};
