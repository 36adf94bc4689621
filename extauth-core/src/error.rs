use thiserror::Error;

/// Errors returned by the external provider layer.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider configuration cannot be used.
    #[error("Invalid provider configuration: {0}")]
    ConfigInvalid(String),
    /// The `state` parameter was tampered with, expired or signed with another algorithm.
    #[error("OAuth state is invalid: {0}")]
    InvalidState(String),
    /// No provider is configured under the requested name.
    #[error("Unsupported provider: {0}")]
    UnknownProvider(String),
    /// The authorization code could not be exchanged for tokens.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),
    /// The profile could not be fetched after a successful exchange.
    #[error("Error getting user profile from external provider: {0}")]
    ProfileFetchFailed(String),
    /// The provider redirected back with an error instead of a code.
    #[error("Provider denied the authorization request: {error}")]
    ProviderDenied {
        /// The OAuth `error` parameter.
        error: String,
        /// The optional `error_description` parameter.
        description: Option<String>,
    },
    /// The account-linking hand-off rejected the identity.
    #[error("Account linking failed: {0}")]
    AccountLinking(String),
}

impl AuthError {
    /// Stable machine-readable code for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::ConfigInvalid(_) => "config_invalid",
            AuthError::InvalidState(_) => "invalid_state",
            AuthError::UnknownProvider(_) => "unknown_provider",
            AuthError::TokenExchangeFailed(_) => "token_exchange_failed",
            AuthError::ProfileFetchFailed(_) => "profile_fetch_failed",
            AuthError::ProviderDenied { .. } => "provider_denied",
            AuthError::AccountLinking(_) => "account_linking_failed",
        }
    }

    /// Whether the caller may retry the same request.
    ///
    /// Always `false`: codes are single-use and state tokens are time-boxed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
