//! Authentication for embedded multi-tenant apps.
//!
//! This module holds everything between an untrusted inbound request and an
//! established per-shop session:
//!
//! - [`signature`]: HMAC verification of signed GET queries and raw POST
//!   bodies
//! - [`session_token`]: verification of platform-issued session tokens
//! - [`token_exchange`]: the two grant protocols that turn proofs of
//!   identity into API access tokens
//! - [`Authenticator`]: the state machine coordinating them per request
//! - [`Session`], [`AccessScopes`], [`AssociatedUser`]: the resulting
//!   authenticated state
//!
//! # Session Types
//!
//! The platform issues two kinds of access tokens:
//!
//! - **Offline tokens** are shop-scoped and long-lived; their sessions use
//!   the deterministic id `offline_<shop>`. The default.
//! - **Online tokens** are scoped to the viewing user and expire; their
//!   sessions use `<shop>_<user-id>` and carry an [`AssociatedUser`].
//!   Enabled with
//!   [`AppConfigBuilder::use_online_tokens`](crate::AppConfigBuilder::use_online_tokens).

mod associated_user;
mod authenticator;
mod error;
mod hooks;
mod scopes;
pub mod session;
pub mod session_token;
pub mod signature;
pub mod token_exchange;

pub use associated_user::AssociatedUser;
pub use authenticator::{AuthOutcome, Authenticator, BounceRedirect};
pub use error::{AuthError, AuthRequestError, CallbackError, ExchangeError, ExchangeErrorKind};
pub use hooks::{AppHooks, NoopHooks};
pub use scopes::AccessScopes;
pub use session::{AccessTokenResponse, Session};
pub use session_token::SessionTokenClaims;
pub use token_exchange::RequestedTokenKind;
