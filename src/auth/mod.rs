pub mod client;
pub mod notifier;
pub mod session;

// Re-export the session pieces so code outside can do
// "use crate::auth::{AuthClient, SessionController};"
pub use client::AuthClient;
pub use notifier::{AutoAckNotifier, ExpiryNotifier};
pub use session::{RefreshOutcome, SessionController, SessionEvent};
