//! Subcommand implementations.
//!
//! Commands print results to stdout. Notifications published while a
//! command runs are printed after it finishes, errors first marked with `!`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod orders;

use secrecy::SecretString;
use tokio::sync::broadcast::Receiver;

use storefront_client::{AppError, Notification, Severity, Storefront};

/// Print every notification waiting in `rx`.
pub fn print_notifications(rx: &mut Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        let marker = match notification.severity {
            Severity::Info => '*',
            Severity::Error => '!',
        };
        println!(
            "{marker} {}: {}",
            notification.title, notification.message
        );
    }
}

/// Restore the persisted session and return its token.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` if no valid session is stored.
pub async fn require_token(storefront: &Storefront) -> Result<SecretString, AppError> {
    storefront.session().bootstrap().await?;
    storefront
        .session()
        .token()
        .ok_or(AppError::NotAuthenticated)
}

/// Expire the session if `error` says the backend rejected the token.
pub fn expire_if_unauthorized(storefront: &Storefront, error: AppError) -> AppError {
    if error.is_unauthorized() {
        storefront.session().expire();
    }
    error
}
