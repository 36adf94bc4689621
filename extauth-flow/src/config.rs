use extauth_core::{AuthError, ProviderConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Prefix of every environment key read by [`FlowConfig::from_env`].
pub const ENV_PREFIX: &str = "EXTAUTH";

const DEFAULT_STATE_TTL_SECS: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Longest accepted state token lifetime.
pub const MAX_STATE_TTL_SECS: u64 = 3600;

fn default_state_ttl_secs() -> u64 {
    DEFAULT_STATE_TTL_SECS
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Process-wide configuration of the external sign-in flow.
///
/// Loaded once at start-up and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Secret the `state` parameter is signed with.
    pub jwt_secret: String,
    /// Where users land after the flow when no `redirect_to` was accepted.
    pub site_url: String,
    /// Extra URLs `redirect_to` may point at, besides the site itself.
    #[serde(default)]
    pub uri_allow_list: Vec<String>,
    /// Lifetime of a state token, in seconds.
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
    /// Timeout applied to every provider call, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Provider settings keyed by lower-case provider name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl FlowConfig {
    /// A configuration with defaults and no providers.
    pub fn new(jwt_secret: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            site_url: site_url.into(),
            uri_allow_list: Vec::new(),
            state_ttl_secs: DEFAULT_STATE_TTL_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            providers: HashMap::new(),
        }
    }

    /// Add (or replace) the settings for a provider.
    pub fn provider(mut self, name: &str, config: ProviderConfig) -> Self {
        self.providers
            .insert(crate::registry::normalize(name), config);
        self
    }

    /// Allow `redirect_to` to target `url`.
    pub fn allow_redirect(mut self, url: impl Into<String>) -> Self {
        self.uri_allow_list.push(url.into());
        self
    }

    /// Reject settings the flow cannot run with.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.is_empty() {
            return Err(AuthError::ConfigInvalid("missing JWT secret".into()));
        }
        if self.site_url.is_empty() {
            return Err(AuthError::ConfigInvalid("missing site URL".into()));
        }
        Url::parse(&self.site_url).map_err(|e| {
            AuthError::ConfigInvalid(format!("invalid site URL {}: {e}", self.site_url))
        })?;
        if self.state_ttl_secs == 0 {
            return Err(AuthError::ConfigInvalid("state TTL must be positive".into()));
        }
        if self.state_ttl_secs > MAX_STATE_TTL_SECS {
            return Err(AuthError::ConfigInvalid(format!(
                "state TTL of {}s exceeds the {MAX_STATE_TTL_SECS}s limit",
                self.state_ttl_secs
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(AuthError::ConfigInvalid("HTTP timeout must be positive".into()));
        }
        Ok(())
    }

    /// State token lifetime.
    pub fn state_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.state_ttl_secs).unwrap_or(i64::MAX);
        chrono::Duration::seconds(secs.min(i64::MAX / 1000))
    }

    /// Provider call timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether `target` is an acceptable post-login destination.
    pub fn is_redirect_allowed(&self, target: &str) -> bool {
        self.allowed_redirect(target).is_some()
    }

    /// The parsed `target` if it is an acceptable post-login destination.
    ///
    /// Accepted targets share the site's origin, or share an allow-listed URL's origin and sit
    /// under its path.
    pub fn allowed_redirect(&self, target: &str) -> Option<Url> {
        let target_url = Url::parse(target).ok()?;
        let same_site = Url::parse(&self.site_url)
            .is_ok_and(|site| site.origin() == target_url.origin());
        let listed = self
            .uri_allow_list
            .iter()
            .filter_map(|allowed| Url::parse(allowed).ok())
            .any(|allowed| {
                allowed.origin() == target_url.origin()
                    && path_within(allowed.path(), target_url.path())
            });
        (same_site || listed).then_some(target_url)
    }

    /// Load from the process environment for the given provider names.
    pub fn from_env(provider_names: &[&str]) -> Result<Self, AuthError> {
        Self::from_lookup(provider_names, |key| std::env::var(key).ok())
    }

    /// Load through `lookup`, reading `EXTAUTH_*` keys.
    ///
    /// Providers without an `EXTAUTH_EXTERNAL_<NAME>_CLIENT_ID` key are left out.
    pub fn from_lookup<F>(provider_names: &[&str], lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(&format!("{ENV_PREFIX}_{key}"))
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AuthError::ConfigInvalid(format!("{ENV_PREFIX}_{key} is not set")))
        };
        let seconds = |key: &str, default: u64| -> Result<u64, AuthError> {
            match lookup(&format!("{ENV_PREFIX}_{key}")) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    AuthError::ConfigInvalid(format!("{ENV_PREFIX}_{key} is not a number: {raw}"))
                }),
                None => Ok(default),
            }
        };

        let mut config = Self::new(required("JWT_SECRET")?, required("SITE_URL")?);
        config.state_ttl_secs = seconds("STATE_TTL_SECS", DEFAULT_STATE_TTL_SECS)?;
        config.http_timeout_secs = seconds("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        config.uri_allow_list = lookup(&format!("{ENV_PREFIX}_URI_ALLOW_LIST"))
            .map(|raw| extauth_core::config::split_list(&raw))
            .unwrap_or_default();

        for name in provider_names {
            let prefix = format!(
                "{ENV_PREFIX}_EXTERNAL_{}",
                name.trim().to_ascii_uppercase()
            );
            if let Some(provider) = ProviderConfig::from_lookup(&prefix, &lookup)? {
                config = config.provider(name, provider);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// `path` equals `base` or lies below it on a segment boundary.
fn path_within(base: &str, path: &str) -> bool {
    if base.ends_with('/') {
        return path.starts_with(base);
    }
    path == base
        || path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}
