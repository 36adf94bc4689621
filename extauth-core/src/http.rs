use crate::error::AuthError;
use crate::state::OAuthToken;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Pick the configured base URL, or `default_host` when none is set.
///
/// One trailing `/` is trimmed either way.
pub fn choose_host(base: &str, default_host: &str) -> String {
    let host = if base.is_empty() { default_host } else { base };
    host.strip_suffix('/').unwrap_or(host).to_string()
}

/// GET `url` with the access token as a bearer credential and decode the JSON body.
///
/// Unknown fields in the body are ignored by the target type.
pub async fn make_request<T>(
    http: &reqwest::Client,
    token: &OAuthToken,
    url: &str,
) -> Result<T, AuthError>
where
    T: DeserializeOwned,
{
    let response = http
        .get(url)
        .bearer_auth(&token.access_token)
        .send()
        .await
        .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::ProfileFetchFailed(format!(
            "{url} returned {status}: {body}"
        )));
    }

    debug!(%url, "profile request succeeded");

    response
        .json::<T>()
        .await
        .map_err(|e| AuthError::ProfileFetchFailed(format!("invalid profile response: {e}")))
}
