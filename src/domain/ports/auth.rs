use crate::domain::models::SecurityConfig;

/// Validates bearer tokens and their scopes on behalf of the HTTP layer.
///
/// Core only hands over the `security` section of the configuration and
/// treats whatever identity comes back as opaque.
pub trait AuthScopeChecker: Send + Sync {
    /// Resolved caller identity
    type Identity: Send;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Check `token` against `required_scopes`.
    ///
    /// `Ok(None)` means the token was valid but carried no identity.
    fn check(
        &self,
        security: &SecurityConfig,
        token: &str,
        required_scopes: &[&str],
    ) -> Result<Option<Self::Identity>, Self::Error>;
}
