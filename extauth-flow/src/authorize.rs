use crate::registry::normalize;
use crate::ExternalAuth;
use extauth_core::{AccountLinker, AuthError, StateClaims};
use serde::Deserialize;
use tracing::{info, warn};

/// Query parameters of an authorize request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Name of the provider to sign in with.
    #[serde(default)]
    pub provider: String,
    /// Where the user wants to land afterwards; dropped unless allowed.
    #[serde(default)]
    pub redirect_to: Option<String>,
    /// Request-time extra scopes, comma-separated.
    #[serde(default)]
    pub scopes: Option<String>,
    /// Invite being redeemed.
    #[serde(default)]
    pub invite_token: Option<String>,
    /// Existing account to link the identity to.
    #[serde(skip)]
    pub linking_target_id: Option<String>,
}

impl AuthorizeRequest {
    /// A plain sign-in with `provider`.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }
}

/// Where to send the user, and the state that was signed for it.
#[derive(Debug, Clone)]
pub struct AuthorizeRedirect {
    /// The provider's authorization URL.
    pub url: String,
    /// The signed `state` embedded in `url`.
    pub state: String,
}

impl<M: AccountLinker> ExternalAuth<M> {
    /// Start a sign-in: sign the round-trip context and build the provider's authorization URL.
    ///
    /// Nothing is stored server-side. Fails before any redirect when the provider is unknown
    /// or misconfigured.
    pub fn authorize(&self, request: &AuthorizeRequest) -> Result<AuthorizeRedirect, AuthError> {
        let name = normalize(&request.provider);
        let provider = self.provider(&name, request.scopes.as_deref().unwrap_or_default())?;

        let config = self.config();
        let mut claims = StateClaims::new(name.clone(), config.site_url.clone());
        if let Some(target) = request.redirect_to.as_deref().filter(|t| !t.is_empty()) {
            if let Some(url) = config.allowed_redirect(target) {
                claims = claims.with_referrer(url.to_string());
            } else {
                warn!(provider = %name, redirect_to = %target, "ignoring redirect_to outside the allow list");
            }
        }
        if let Some(invite) = request.invite_token.as_deref().filter(|t| !t.is_empty()) {
            claims = claims.with_invite_token(invite);
        }
        if let Some(target) = request.linking_target_id.as_deref() {
            claims = claims.with_linking_target(target);
        }

        let state = self.codec().sign(&claims)?;
        let url = provider.auth_code_url(&state);

        info!(provider = %name, "redirecting to external provider");
        Ok(AuthorizeRedirect { url, state })
    }
}
