//! Account commands.

use secrecy::SecretString;

use storefront_client::{AppError, Storefront};

/// Registration details collected from the command line.
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

/// Sign in and persist the token.
///
/// # Errors
///
/// Returns `AppError::Session` if the email is invalid or the backend
/// refuses the credentials.
pub async fn login(storefront: &Storefront, email: &str, password: String) -> Result<(), AppError> {
    let session = storefront
        .session()
        .login(email, SecretString::from(password))
        .await?;

    if session.is_admin {
        tracing::info!("Signed in with admin rights");
    }
    Ok(())
}

/// Create an account and sign in with it.
///
/// # Errors
///
/// Returns `AppError::Session` if the email is invalid or the backend
/// refuses the registration.
pub async fn register(storefront: &Storefront, form: RegisterForm) -> Result<(), AppError> {
    storefront
        .session()
        .register(
            &form.name,
            &form.email,
            SecretString::from(form.password),
            &form.phone,
            &form.address,
        )
        .await?;
    Ok(())
}

/// Restore the stored session and print the account.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` if no valid session is stored.
pub async fn whoami(storefront: &Storefront) -> Result<(), AppError> {
    storefront.session().bootstrap().await?;
    let session = storefront
        .session()
        .current()
        .ok_or(AppError::NotAuthenticated)?;

    let profile = &session.profile;
    println!("{} <{}>", profile.name, profile.email);
    if let Some(phone) = &profile.phone {
        println!("  phone: {phone}");
    }
    if let Some(address) = &profile.address {
        println!("  address: {address}");
    }
    if session.is_admin {
        println!("  admin");
    }
    Ok(())
}
