pub mod claims;
pub mod tokens;

pub use claims::SessionClaims;
pub use tokens::{LoginResponse, RefreshResponse};
