use crate::ExternalAuth;
use extauth_core::{AccountLinker, AuthError, StateClaims, UserProvidedData};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Parameters the provider redirects back with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackRequest {
    /// The authorization code; absent when the provider reports an error.
    #[serde(default)]
    pub code: Option<String>,
    /// The signed state issued by the authorize step.
    #[serde(default)]
    pub state: String,
    /// OAuth error code sent instead of a code.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable companion of `error`.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallbackRequest {
    /// A successful redirect carrying `code` and `state`.
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            state: state.into(),
            ..Default::default()
        }
    }
}

/// Progress of a callback; errors exit early from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    /// Nothing checked yet.
    Idle,
    /// The state token verified.
    StateVerified,
    /// The code was exchanged for tokens.
    TokenExchanged,
    /// The profile was fetched and normalized.
    ProfileFetched,
    /// The identity was handed to the account linker.
    Done,
}

impl fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackStage::Idle => "idle",
            CallbackStage::StateVerified => "state_verified",
            CallbackStage::TokenExchanged => "token_exchanged",
            CallbackStage::ProfileFetched => "profile_fetched",
            CallbackStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a completed callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome<U> {
    /// The normalized identity.
    pub user_data: UserProvidedData,
    /// The verified round-trip context.
    pub claims: StateClaims,
    /// Whatever the account linker returned.
    pub local_user: U,
}

impl<U> CallbackOutcome<U> {
    /// Where to send the user now.
    pub fn return_to(&self) -> &str {
        self.claims.return_to()
    }
}

impl<M: AccountLinker> ExternalAuth<M> {
    /// Complete a sign-in.
    ///
    /// The state is verified before anything else; no exchange is attempted for a request
    /// whose state does not verify. The code is exchanged exactly once.
    pub async fn callback(
        &self,
        request: &CallbackRequest,
    ) -> Result<CallbackOutcome<M::LocalUser>, AuthError> {
        let mut stage = CallbackStage::Idle;
        debug!(%stage, "callback received");

        let claims = self.codec().verify(&request.state).map_err(|e| {
            warn!(error = %e, "rejecting callback with invalid state");
            AuthError::from(e)
        })?;
        stage = CallbackStage::StateVerified;
        debug!(%stage, provider = %claims.provider);

        if let Some(error) = request.error.as_deref().filter(|e| !e.is_empty()) {
            warn!(provider = %claims.provider, %error, "provider denied the authorization request");
            return Err(AuthError::ProviderDenied {
                error: error.to_string(),
                description: request.error_description.clone(),
            });
        }

        let code = request
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::TokenExchangeFailed("callback carried no code".into()))?;

        let provider = self.provider(&claims.provider, "")?;

        let token = provider.exchange_code(code).await.map_err(|e| match e {
            AuthError::TokenExchangeFailed(_) => e,
            other => AuthError::TokenExchangeFailed(other.to_string()),
        })?;
        stage = CallbackStage::TokenExchanged;
        debug!(%stage, provider = %claims.provider);

        let user_data = match provider.fetch_user_data(&token).await {
            Ok(data) => data,
            Err(e) => {
                // The tokens are discarded here; a retry needs a fresh authorization.
                warn!(
                    provider = %claims.provider,
                    error = %e,
                    has_refresh_token = token.refresh_token.is_some(),
                    expires_in = ?token.expires_in,
                    "profile fetch failed after a successful token exchange"
                );
                return Err(match e {
                    AuthError::ProfileFetchFailed(_) => e,
                    other => AuthError::ProfileFetchFailed(other.to_string()),
                });
            }
        };
        stage = CallbackStage::ProfileFetched;
        debug!(%stage, provider = %claims.provider, subject = %user_data.metadata.subject);

        let local_user = self.linker().link(&user_data, &claims).await?;
        stage = CallbackStage::Done;
        info!(%stage, provider = %claims.provider, subject = %user_data.metadata.subject, "external sign-in completed");

        Ok(CallbackOutcome {
            user_data,
            claims,
            local_user,
        })
    }
}
