//! Descope provider for extauth.
//!
//! Descope scopes OAuth applications by project: an operator who sets the provider URL to
//! `https://<anything>/<project-id>` gets endpoints under `https://api.descope.com/<project-id>`.
//! Only the path segment of the configured URL is used; the host always comes from the default
//! API base.

use async_trait::async_trait;
use extauth_core::http::{choose_host, make_request};
use extauth_core::oauth2::{merge_scopes, AuthStyle, ClientConfig, Endpoint};
use extauth_core::{
    AuthError, Email, OAuthProvider, OAuthToken, ProviderConfig, ProviderMetadata,
    UserProvidedData,
};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Public Descope API base.
pub const DEFAULT_DESCOPE_API_BASE: &str = "https://api.descope.com";

const REQUIRED_SCOPES: &[&str] = &["openid", "profile", "email"];

pub struct DescopeProvider {
    config: ClientConfig,
    api_host: String,
    http: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescopeUser {
    sub: String,
    name: String,
    email: String,
    email_verified: bool,
    phone_number: String,
    phone_verified: bool,
    family_name: String,
    given_name: String,
    picture: String,
}

impl DescopeProvider {
    pub const ID: &'static str = "descope";

    /// Build an adapter against the public Descope API.
    ///
    /// `scopes` are request-time extras (comma-separated) merged with the configured ones.
    pub fn new(
        ext: &ProviderConfig,
        scopes: &str,
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        Self::with_default_base(ext, scopes, http, DEFAULT_DESCOPE_API_BASE)
    }

    /// Same as [`DescopeProvider::new`], with a relocated default API base.
    pub fn with_default_base(
        ext: &ProviderConfig,
        scopes: &str,
        http: reqwest::Client,
        default_base: &str,
    ) -> Result<Self, AuthError> {
        ext.validate_oauth()?;

        let client_id = ext
            .primary_client_id()
            .ok_or_else(|| AuthError::ConfigInvalid("missing OAuth client ID".into()))?;

        let extra = ext
            .extra_scopes()
            .into_iter()
            .chain(extauth_core::config::split_list(scopes));
        let oauth_scopes = merge_scopes(REQUIRED_SCOPES, extra);

        let api_host = resolve_api_host(ext.url.as_deref(), default_base)?;
        debug!(%api_host, "resolved Descope API host");

        let endpoint = Endpoint::new(
            &format!("{api_host}/oauth2/v1/authorize"),
            &format!("{api_host}/oauth2/v1/token"),
            AuthStyle::InParams,
        )?;

        Ok(Self {
            config: ClientConfig {
                client_id: client_id.to_string(),
                client_secret: ext.secret.clone(),
                endpoint,
                redirect_url: ext.redirect_uri.clone(),
                scopes: oauth_scopes,
            },
            api_host,
            http,
        })
    }

    /// The host token and profile calls are made against.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// Scopes requested on authorization.
    pub fn scopes(&self) -> &[String] {
        &self.config.scopes
    }
}

/// Derive the effective API host from the configured URL.
///
/// When the configured URL has a path, its first segment is the project id and is appended
/// to `default_base`. Otherwise `default_base` is used as is.
pub fn resolve_api_host(configured: Option<&str>, default_base: &str) -> Result<String, AuthError> {
    let base_url = choose_host(configured.unwrap_or_default(), default_base);
    let default_host = choose_host("", default_base);

    let parsed = Url::parse(&base_url)
        .map_err(|e| AuthError::ConfigInvalid(format!("invalid Descope URL {base_url}: {e}")))?;

    let project_id = parsed
        .path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|segment| !segment.is_empty());

    Ok(match project_id {
        Some(id) => format!("{default_host}/{id}"),
        None => default_host,
    })
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[async_trait]
impl OAuthProvider for DescopeProvider {
    fn provider_id(&self) -> &str {
        Self::ID
    }

    fn auth_code_url(&self, state: &str) -> String {
        self.config.auth_code_url(state)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AuthError> {
        self.config.exchange(&self.http, code).await
    }

    async fn fetch_user_data(&self, token: &OAuthToken) -> Result<UserProvidedData, AuthError> {
        let url = format!("{}/oauth2/v1/userinfo", self.api_host);
        let u: DescopeUser = make_request(&self.http, token, &url).await?;

        if u.sub.is_empty() {
            return Err(AuthError::ProfileFetchFailed(
                "Descope profile has no subject".into(),
            ));
        }

        let mut data = UserProvidedData::default();
        if !u.email.is_empty() {
            data.emails.push(Email::new(u.email.clone(), u.email_verified, true));
        }

        data.metadata = ProviderMetadata {
            issuer: self.api_host.clone(),
            subject: u.sub.clone(),
            provider_id: u.sub,
            name: non_empty(u.name),
            given_name: non_empty(u.given_name),
            family_name: non_empty(u.family_name),
            picture: non_empty(u.picture),
            email: non_empty(u.email),
            email_verified: u.email_verified,
            phone: non_empty(u.phone_number),
            phone_verified: u.phone_verified,
        };

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            url: None,
            client_id: vec!["descope_client".into(), "other_client".into()],
            secret: "descope_secret".into(),
            redirect_uri: "http://localhost/callback".into(),
            scopes: None,
        }
    }

    #[test]
    fn api_host_defaults_without_url() {
        assert_eq!(
            resolve_api_host(None, DEFAULT_DESCOPE_API_BASE).unwrap(),
            "https://api.descope.com"
        );
        assert_eq!(
            resolve_api_host(Some("https://api.descope.com/"), DEFAULT_DESCOPE_API_BASE).unwrap(),
            "https://api.descope.com"
        );
    }

    #[test]
    fn api_host_rides_project_on_default_base() {
        assert_eq!(
            resolve_api_host(Some("https://auth.example.com/P2abc"), DEFAULT_DESCOPE_API_BASE)
                .unwrap(),
            "https://api.descope.com/P2abc"
        );
        assert_eq!(
            resolve_api_host(
                Some("https://auth.example.com/P2abc/extra/"),
                DEFAULT_DESCOPE_API_BASE
            )
            .unwrap(),
            "https://api.descope.com/P2abc"
        );
    }

    #[test]
    fn custom_host_without_project_is_ignored() {
        assert_eq!(
            resolve_api_host(Some("https://auth.example.com"), DEFAULT_DESCOPE_API_BASE).unwrap(),
            "https://api.descope.com"
        );
    }

    #[test]
    fn unparseable_url_is_config_error() {
        let result = resolve_api_host(Some("not a url/P2abc"), DEFAULT_DESCOPE_API_BASE);
        assert!(matches!(result, Err(AuthError::ConfigInvalid(_))));
    }

    #[test]
    fn construction_validates_config() {
        let mut c = config();
        c.secret.clear();
        let result = DescopeProvider::new(&c, "", reqwest::Client::new());
        assert!(matches!(result, Err(AuthError::ConfigInvalid(_))));
    }

    #[test]
    fn auth_code_url_uses_first_client_and_merged_scopes() {
        let mut c = config();
        c.scopes = Some("email,offline_access".into());
        let provider = DescopeProvider::new(&c, "tenants,openid", reqwest::Client::new()).unwrap();

        assert_eq!(
            provider.scopes(),
            ["openid", "profile", "email", "offline_access", "tenants"]
        );

        let url = Url::parse(&provider.auth_code_url("signed-state")).unwrap();
        let q: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.as_str().split('?').next(), Some("https://api.descope.com/oauth2/v1/authorize"));
        assert_eq!(q["client_id"], "descope_client");
        assert_eq!(q["redirect_uri"], "http://localhost/callback");
        assert_eq!(q["response_type"], "code");
        assert_eq!(q["scope"], "openid profile email offline_access tenants");
        assert_eq!(q["state"], "signed-state");
    }
}
