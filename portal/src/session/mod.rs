pub mod authority;
pub mod store;
pub mod token;

pub use authority::{Gate, LoginSuccess, SessionAuthority, SessionStatus, SessionView};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
pub use token::{MintedToken, TokenCodec, TokenError};
