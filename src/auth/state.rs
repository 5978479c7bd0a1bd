//! What router state must expose for the auth extractors and session flows.

use crate::db::Database;
use crate::jwt::JwtConfig;

/// State that can verify access tokens and reach the user and token stores.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn db(&self) -> &Database;
}

/// State that accepts calls from the payment service.
pub trait HasServiceKey {
    /// The configured API key. Empty means no caller is trusted.
    fn service_key(&self) -> &str;
}

/// Implement [`HasAuthBackend`] for a state struct holding
/// `db: Database` and `jwt: Arc<JwtConfig>`.
///
/// ```ignore
/// #[derive(Clone)]
/// pub struct ChirpsState {
///     pub db: Database,
///     pub jwt: Arc<JwtConfig>,
/// }
///
/// impl_has_auth_backend!(ChirpsState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state:ty) => {
        impl $crate::auth::HasAuthBackend for $state {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                self.jwt.as_ref()
            }

            fn db(&self) -> &$crate::db::Database {
                &self.db
            }
        }
    };
}
