use axum::extract::{Form, FromRef, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use extauth_core::{AccountLinker, AuthError};
use extauth_flow::{AuthorizeRequest, CallbackRequest, ExternalAuth};
use serde::Serialize;

/// An [`AuthError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ExtauthAxumError(pub AuthError);

impl From<AuthError> for ExtauthAxumError {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    error_code: &'static str,
    msg: String,
}

/// HTTP status for an error kind.
pub fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::ConfigInvalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::InvalidState(_) | AuthError::ProviderDenied { .. } => StatusCode::BAD_REQUEST,
        AuthError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        AuthError::TokenExchangeFailed(_) | AuthError::ProfileFetchFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        AuthError::AccountLinking(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ExtauthAxumError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error_code = self.0.kind(), error = %self.0, "external sign-in failed");
        } else {
            tracing::debug!(error_code = self.0.kind(), error = %self.0, "external sign-in rejected");
        }

        let body = ErrorBody {
            code: status.as_u16(),
            error_code: self.0.kind(),
            msg: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// A `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `GET /authorize?provider=<name>`: redirect to the provider with a signed state.
pub async fn axum_authorize_handler<AppState, M>(
    State(auth): State<ExternalAuth<M>>,
    Query(request): Query<AuthorizeRequest>,
) -> Result<Response, ExtauthAxumError>
where
    AppState: Send + Sync,
    M: AccountLinker + 'static,
    ExternalAuth<M>: FromRef<AppState>,
{
    let redirect = auth.authorize(&request)?;
    Ok(found(&redirect.url))
}

/// `GET /callback?code=..&state=..`: finish the sign-in and send the user back to the site.
pub async fn axum_callback_handler<AppState, M>(
    State(auth): State<ExternalAuth<M>>,
    Query(request): Query<CallbackRequest>,
) -> Result<Response, ExtauthAxumError>
where
    AppState: Send + Sync,
    M: AccountLinker + 'static,
    ExternalAuth<M>: FromRef<AppState>,
{
    complete(&auth, &request).await
}

/// `POST /callback` for providers using `response_mode=form_post`.
pub async fn axum_callback_form_handler<AppState, M>(
    State(auth): State<ExternalAuth<M>>,
    Form(request): Form<CallbackRequest>,
) -> Result<Response, ExtauthAxumError>
where
    AppState: Send + Sync,
    M: AccountLinker + 'static,
    ExternalAuth<M>: FromRef<AppState>,
{
    complete(&auth, &request).await
}

async fn complete<M: AccountLinker>(
    auth: &ExternalAuth<M>,
    request: &CallbackRequest,
) -> Result<Response, ExtauthAxumError> {
    let outcome = auth.callback(request).await?;
    Ok(found(outcome.return_to()))
}
