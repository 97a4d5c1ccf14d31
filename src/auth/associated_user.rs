//! Associated-user types for online sessions.
//!
//! When an app uses online (per-user) access tokens, the token-exchange
//! response includes information about the user the token is scoped to.
//! That information is stored in the [`AssociatedUser`] struct.

use serde::{Deserialize, Serialize};

/// The platform user an online session is scoped to.
///
/// Parsed from the `associated_user` object of a token-exchange response
/// and carried on the [`Session`](crate::Session) so that embedding
/// applications can attribute actions to a person.
///
/// # Thread Safety
///
/// `AssociatedUser` is `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use shopauth::AssociatedUser;
///
/// let user: AssociatedUser = serde_json::from_str(
///     r#"{
///         "id": 12345,
///         "first_name": "Jane",
///         "last_name": "Doe",
///         "email": "jane@example.com",
///         "email_verified": true,
///         "account_owner": true,
///         "locale": "en",
///         "collaborator": false
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(user.id, 12345);
/// assert_eq!(user.email, "jane@example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedUser {
    /// The platform user id (numeric).
    pub id: u64,

    /// The user's first name.
    pub first_name: String,

    /// The user's last name.
    pub last_name: String,

    /// The user's email address.
    pub email: String,

    /// Whether the user's email has been verified.
    pub email_verified: bool,

    /// Whether the user is the account owner.
    pub account_owner: bool,

    /// The user's locale preference (e.g., "en", "fr").
    pub locale: String,

    /// Whether the user is a collaborator.
    pub collaborator: bool,
}

// Verify AssociatedUser is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AssociatedUser>();
};
