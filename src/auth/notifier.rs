use async_trait::async_trait;
use tracing::info;

/// Presents the "your session has ended" notice to the user and resolves
/// once it is acknowledged. Implementations never perform the logout
/// themselves; the interceptor calls the session controller after the
/// notice resolves.
#[async_trait]
pub trait ExpiryNotifier: Send + Sync {
    /// Returns true when the user acknowledged the notice (or the variant
    /// is unconditional), allowing logout to proceed.
    async fn session_expired(&self) -> bool;
}

/// A notifier that logs the notice and acknowledges immediately, for
/// embedders without a blocking dialog.
pub struct AutoAckNotifier;

#[async_trait]
impl ExpiryNotifier for AutoAckNotifier {
    async fn session_expired(&self) -> bool {
        info!("Session expired; redirecting to login.");
        true
    }
}
