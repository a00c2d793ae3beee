//! Request-scoped security context.

use crate::principal::{Authentication, Principal};
use strata_core::{StrataError, StrataResult};
use tracing::debug;

/// Source of the principal for the current request.
///
/// Passed explicitly to whatever needs the caller's identity.
pub trait PrincipalProvider: Send + Sync {
    /// Returns the authenticated principal.
    ///
    /// # Errors
    ///
    /// Fails with [`StrataError::AuthenticationExpired`] when nobody is
    /// authenticated, the authentication lapsed, or the account is disabled
    /// or locked.
    fn current_principal(&self) -> StrataResult<&Principal>;

    /// Requires the current principal to hold `authority`.
    ///
    /// # Errors
    ///
    /// Propagates [`current_principal`](Self::current_principal) failures and
    /// returns [`StrataError::Forbidden`] when the authority is missing.
    fn require_authority(&self, authority: &str) -> StrataResult<&Principal> {
        let principal = self.current_principal()?;
        if principal.has_authority(authority) {
            Ok(principal)
        } else {
            Err(StrataError::forbidden(format!(
                "Permission denied: '{}' requires authority {}",
                principal.username, authority
            )))
        }
    }
}

/// Security state of one request.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    /// An unauthenticated context.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(authentication: Authentication) -> Self {
        Self {
            authentication: Some(authentication),
        }
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    pub fn set_authentication(&mut self, authentication: Authentication) {
        self.authentication = Some(authentication);
    }

    /// Drops the authentication, e.g. on logout.
    pub fn clear(&mut self) {
        self.authentication = None;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authentication.as_ref().is_some_and(Authentication::is_valid)
    }
}

impl PrincipalProvider for SecurityContext {
    fn current_principal(&self) -> StrataResult<&Principal> {
        match &self.authentication {
            Some(auth) if auth.is_valid() => Ok(&auth.principal),
            Some(auth) => {
                debug!(
                    username = %auth.principal.username,
                    authenticated = auth.authenticated,
                    expired = auth.is_expired(),
                    "Rejected stale authentication"
                );
                Err(StrataError::AuthenticationExpired)
            }
            None => Err(StrataError::AuthenticationExpired),
        }
    }
}
