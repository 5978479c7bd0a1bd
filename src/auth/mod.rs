//! Authentication and authorization.
//!
//! Two credential tiers: stateless access tokens checked on every protected
//! request, and store-backed refresh tokens consulted only by the login,
//! refresh and revoke flows in [`session`]. Service callers present an API key
//! instead and never map to a principal.

mod credentials;
mod errors;
mod extractors;
mod policy;
pub mod session;
mod state;

pub use credentials::{
    API_KEY_PREFIX, BEARER_PREFIX, CredentialError, extract_api_key, extract_bearer,
};
pub use errors::AuthError;
pub use extractors::{Auth, BearerToken, ServiceAuth};
pub use policy::{authenticate, authorize_owner, authorize_service, constant_time_eq};
pub use state::{HasAuthBackend, HasServiceKey};
