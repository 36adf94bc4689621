use crate::error::AuthError;
use crate::state::OAuthToken;
use reqwest::header::ACCEPT;
use url::Url;

/// How client credentials are presented to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStyle {
    /// `client_id` and `client_secret` travel in the form body.
    #[default]
    InParams,
    /// Credentials are sent with HTTP Basic authentication.
    InHeader,
}

/// Authorization and token endpoints of a provider.
#[derive(Debug, Clone)]
pub struct Endpoint {
    auth_url: Url,
    token_url: Url,
    auth_style: AuthStyle,
}

impl Endpoint {
    /// Parse both endpoint URLs.
    pub fn new(auth_url: &str, token_url: &str, auth_style: AuthStyle) -> Result<Self, AuthError> {
        let parse = |raw: &str| {
            Url::parse(raw)
                .map_err(|e| AuthError::ConfigInvalid(format!("invalid endpoint URL {raw}: {e}")))
        };
        Ok(Self {
            auth_url: parse(auth_url)?,
            token_url: parse(token_url)?,
            auth_style,
        })
    }

    /// The authorization endpoint.
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// The token endpoint.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

/// Authorization-code client configuration for one provider.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client id sent to the provider.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Provider endpoints.
    pub endpoint: Endpoint,
    /// Redirect URI registered with the provider.
    pub redirect_url: String,
    /// Scopes requested on every authorization.
    pub scopes: Vec<String>,
}

impl ClientConfig {
    /// Build the authorization URL for the given `state`.
    pub fn auth_code_url(&self, state: &str) -> String {
        let mut url = self.endpoint.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.client_id);
            query.append_pair("redirect_uri", &self.redirect_url);
            query.append_pair("response_type", "code");
            if !self.scopes.is_empty() {
                query.append_pair("scope", &self.scopes.join(" "));
            }
            query.append_pair("state", state);
        }
        url.to_string()
    }

    /// Perform the authorization-code grant. Made exactly once per code.
    pub async fn exchange(
        &self,
        http: &reqwest::Client,
        code: &str,
    ) -> Result<OAuthToken, AuthError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
        ];

        let mut request = http
            .post(self.endpoint.token_url.clone())
            .header(ACCEPT, "application/json");

        match self.endpoint.auth_style {
            AuthStyle::InParams => {
                form.push(("client_id", self.client_id.as_str()));
                form.push(("client_secret", self.client_secret.as_str()));
            }
            AuthStyle::InHeader => {
                request = request.basic_auth(&self.client_id, Some(&self.client_secret));
            }
        }

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchangeFailed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: OAuthToken = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("invalid token response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(AuthError::TokenExchangeFailed(
                "server response missing access_token".into(),
            ));
        }

        Ok(token)
    }
}

/// Required scopes first, then extras in order, without duplicates.
pub fn merge_scopes<I, S>(required: &[&str], extra: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut scopes: Vec<String> = Vec::new();
    let candidates = required
        .iter()
        .map(|s| s.to_string())
        .chain(extra.into_iter().map(Into::into));
    for scope in candidates {
        let scope = scope.trim().to_string();
        if !scope.is_empty() && !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    scopes
}
