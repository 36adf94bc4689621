use crate::error::AuthError;
use serde::{Deserialize, Serialize};

/// Configuration for a single external provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether the provider may be used at all.
    #[serde(default)]
    pub enabled: bool,
    /// Optional override of the provider's base URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Allowed client identifiers; the first one is used for outgoing requests.
    #[serde(default)]
    pub client_id: Vec<String>,
    /// Client secret.
    #[serde(default)]
    pub secret: String,
    /// Redirect URI registered with the provider.
    #[serde(default)]
    pub redirect_uri: String,
    /// Extra comma-separated scopes requested on top of the provider's required ones.
    #[serde(default)]
    pub scopes: Option<String>,
}

impl ProviderConfig {
    /// Check that the provider can drive an authorization-code flow.
    pub fn validate_oauth(&self) -> Result<(), AuthError> {
        if !self.enabled {
            return Err(AuthError::ConfigInvalid("provider is not enabled".into()));
        }
        if self.primary_client_id().is_none() {
            return Err(AuthError::ConfigInvalid("missing OAuth client ID".into()));
        }
        if self.secret.is_empty() {
            return Err(AuthError::ConfigInvalid("missing OAuth secret".into()));
        }
        if self.redirect_uri.is_empty() {
            return Err(AuthError::ConfigInvalid("missing redirect URI".into()));
        }
        Ok(())
    }

    /// The client id sent to the provider.
    pub fn primary_client_id(&self) -> Option<&str> {
        self.client_id
            .first()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Operator-configured extra scopes.
    pub fn extra_scopes(&self) -> Vec<String> {
        self.scopes.as_deref().map(split_list).unwrap_or_default()
    }

    /// Read a provider's settings through `lookup`, using `prefix` for every key
    /// (e.g. `EXTAUTH_EXTERNAL_DESCOPE`).
    ///
    /// Returns `Ok(None)` when no client id is set for the provider.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Option<Self>, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(client_id) = lookup(&format!("{prefix}_CLIENT_ID")) else {
            return Ok(None);
        };

        let enabled = match lookup(&format!("{prefix}_ENABLED")) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AuthError::ConfigInvalid(format!("{prefix}_ENABLED is not a boolean: {raw}"))
            })?,
            None => true,
        };

        Ok(Some(Self {
            enabled,
            url: lookup(&format!("{prefix}_URL")).filter(|u| !u.is_empty()),
            client_id: split_list(&client_id),
            secret: lookup(&format!("{prefix}_SECRET")).unwrap_or_default(),
            redirect_uri: lookup(&format!("{prefix}_REDIRECT_URI")).unwrap_or_default(),
            scopes: lookup(&format!("{prefix}_SCOPES")).filter(|s| !s.is_empty()),
        }))
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
