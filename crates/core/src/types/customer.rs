//! Customer profile record.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::CustomerId;

/// The profile of an authenticated customer.
///
/// Returned embedded in login and registration responses and by the profile
/// endpoint. The admin flag travels separately, next to the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend customer identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// Display name.
    pub name: String,
    /// Account email address.
    pub email: Email,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
