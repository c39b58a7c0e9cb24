//! Contact form and newsletter commands.

use storefront_client::api::ContactMessage;
use storefront_client::{AppError, Storefront, StorefrontApi};
use storefront_core::Email;

/// Send a message to the store.
///
/// # Errors
///
/// Returns `AppError::InvalidEmail` for a malformed address, or
/// `AppError::Api` if the backend refuses the message.
pub async fn send(
    storefront: &Storefront,
    name: String,
    email: &str,
    subject: String,
    message: String,
) -> Result<(), AppError> {
    let message = ContactMessage {
        name,
        email: Email::parse(email)?,
        subject,
        message,
    };
    let ack = storefront.api().contact(&message).await?;
    println!(
        "{}",
        ack.message
            .as_deref()
            .unwrap_or("Thank you for contacting us.")
    );
    Ok(())
}

/// Subscribe to the newsletter.
///
/// Without `email`, the signed-in account's address is used. The stored
/// session's token is sent along when there is one.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` if no address is given and nobody is
/// signed in, `AppError::InvalidEmail` for a malformed address, or
/// `AppError::Api` if the backend refuses the subscription.
pub async fn subscribe(storefront: &Storefront, email: Option<&str>) -> Result<(), AppError> {
    storefront.session().bootstrap().await?;
    let session = storefront.session().current();

    let email = match (email, &session) {
        (Some(email), _) => Email::parse(email)?,
        (None, Some(session)) => session.profile.email.clone(),
        (None, None) => return Err(AppError::NotAuthenticated),
    };
    let token = session.map(|s| s.token);

    let ack = storefront
        .api()
        .subscribe_newsletter(token.as_ref(), &email)
        .await
        .map_err(|e| super::expire_if_unauthorized(storefront, e.into()))?;
    println!(
        "{}",
        ack.message.as_deref().unwrap_or("Subscribed to newsletter")
    );
    Ok(())
}
