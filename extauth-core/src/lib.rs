//! # Extauth Core
//!
//! `extauth-core` provides the foundational traits and types for the extauth external identity
//! provider layer. It defines the contract every provider adapter implements, the canonical
//! shape of user data they produce, and the error taxonomy shared by the whole flow.

#![warn(missing_docs)]

use async_trait::async_trait;

/// Errors that can occur while talking to an external identity provider.
pub mod error;
pub use crate::error::AuthError;

/// Normalized user data, OAuth tokens and the claims carried through `state`.
pub mod state;
pub use crate::state::{Email, OAuthToken, ProviderMetadata, StateClaims, UserProvidedData};

/// Per-provider configuration.
pub mod config;
pub use crate::config::ProviderConfig;

/// Authorization-code client configuration shared by provider adapters.
pub mod oauth2;

/// Authenticated profile requests and host helpers.
pub mod http;

/// Trait for an external OAuth2/OIDC identity provider.
///
/// An adapter is built once per request (or shared read-only) and never mutated afterwards.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Get the provider identifier.
    fn provider_id(&self) -> &str;

    /// Build the URL the end user is redirected to, carrying the signed `state`.
    fn auth_code_url(&self, state: &str) -> String;

    /// Exchange an authorization code for tokens.
    ///
    /// Codes are single-use, so implementations must not retry.
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AuthError>;

    /// Fetch the user's profile and normalize it.
    async fn fetch_user_data(&self, token: &OAuthToken) -> Result<UserProvidedData, AuthError>;
}

/// Trait for handing a normalized identity to the account-linking layer.
///
/// This is where the surrounding service decides whether the user is new or existing.
#[async_trait]
pub trait AccountLinker: Send + Sync {
    /// The type of the local user object.
    type LocalUser: Send + Sync;

    /// Link or create the local account for the given provider data.
    async fn link(
        &self,
        data: &UserProvidedData,
        claims: &StateClaims,
    ) -> Result<Self::LocalUser, AuthError>;
}

#[async_trait]
impl AccountLinker for () {
    type LocalUser = ();
    async fn link(
        &self,
        _data: &UserProvidedData,
        _claims: &StateClaims,
    ) -> Result<Self::LocalUser, AuthError> {
        Ok(())
    }
}
