use serde::{Deserialize, Serialize};

/// An email address reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// The address itself
    pub email: String,
    /// Whether the provider has verified the address
    pub verified: bool,
    /// Whether this is the user's primary address
    pub primary: bool,
}

impl Email {
    /// Create a new email entry.
    pub fn new(email: impl Into<String>, verified: bool, primary: bool) -> Self {
        Self {
            email: email.into(),
            verified,
            primary,
        }
    }
}

/// Provider-agnostic profile claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// The API host that issued the profile
    pub issuer: String,
    /// The provider-assigned user id; the federation key for account linking
    pub subject: String,
    /// Same value as `subject`, kept for consumers keyed on provider id
    pub provider_id: String,
    /// Full display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Email as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the email was verified by the provider
    #[serde(default)]
    pub email_verified: bool,
    /// Phone number as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Whether the phone number was verified by the provider
    #[serde(default)]
    pub phone_verified: bool,
}

/// The canonical user data every provider adapter produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProvidedData {
    /// Emails in provider order; at most one is primary
    pub emails: Vec<Email>,
    /// Profile claims
    pub metadata: ProviderMetadata,
}

impl UserProvidedData {
    /// The primary email, if the provider reported one.
    pub fn primary_email(&self) -> Option<&Email> {
        self.emails.iter().find(|e| e.primary)
    }
}

/// Represents the tokens returned by an OAuth2 provider.
///
/// Held only for the duration of one callback request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The access token used for API requests
    pub access_token: String,
    /// The type of token (usually "Bearer")
    #[serde(default)]
    pub token_type: String,
    /// Seconds until the access token expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// The refresh token used to obtain new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// The scopes granted by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// The OIDC ID Token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Context round-tripped through the provider inside the signed `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClaims {
    /// Name of the provider the flow was started for
    pub provider: String,
    /// Site the end user returns to after the flow
    pub site_url: String,
    /// Invite being redeemed by this sign-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
    /// Validated `redirect_to` requested by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Existing account the identity should be linked to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linking_target_id: Option<String>,
    /// Identifier of a server-side flow state, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_state_id: Option<String>,
}

impl StateClaims {
    /// Claims for a plain sign-in with no linking context.
    pub fn new(provider: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            site_url: site_url.into(),
            invite_token: None,
            referrer: None,
            linking_target_id: None,
            flow_state_id: None,
        }
    }

    /// Attach a referrer.
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Attach an invite token.
    pub fn with_invite_token(mut self, token: impl Into<String>) -> Self {
        self.invite_token = Some(token.into());
        self
    }

    /// Attach a linking target.
    pub fn with_linking_target(mut self, id: impl Into<String>) -> Self {
        self.linking_target_id = Some(id.into());
        self
    }

    /// Where to send the user once the callback completes.
    pub fn return_to(&self) -> &str {
        self.referrer.as_deref().unwrap_or(&self.site_url)
    }
}
