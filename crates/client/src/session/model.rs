//! Authenticated session record.

use secrecy::SecretString;

use storefront_core::UserProfile;

/// The signed-in identity.
///
/// The token is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: UserProfile,
    pub is_admin: bool,
    pub token: SecretString,
}

impl Session {
    /// Display name of the signed-in customer.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}
