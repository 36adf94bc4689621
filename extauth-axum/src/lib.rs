//! Axum integration for extauth.
//!
//! Mount [`ExtauthAxumExt::axum_router`] to expose `GET /authorize` and `GET|POST /callback`.

pub use extauth_flow::{
    AuthorizeRequest, CallbackRequest, ExternalAuth, FlowConfig, ProviderRegistry,
};
use axum::extract::FromRef;
use extauth_core::AccountLinker;

pub mod helpers;

pub use helpers::*;

/// Application state wrapper for apps that only need the external sign-in routes.
pub struct ExtauthState<M: AccountLinker = ()> {
    pub auth: ExternalAuth<M>,
}

impl<M: AccountLinker> Clone for ExtauthState<M> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<M: AccountLinker> From<ExternalAuth<M>> for ExtauthState<M> {
    fn from(auth: ExternalAuth<M>) -> Self {
        Self { auth }
    }
}

impl<M: AccountLinker> FromRef<ExtauthState<M>> for ExternalAuth<M> {
    fn from_ref(state: &ExtauthState<M>) -> Self {
        state.auth.clone()
    }
}

pub trait ExtauthAxumExt<M: AccountLinker> {
    /// Routes for both halves of the external sign-in.
    fn axum_router<AppState>(&self) -> axum::Router<AppState>
    where
        AppState: Clone + Send + Sync + 'static,
        ExternalAuth<M>: FromRef<AppState>;
}

impl<M: AccountLinker + 'static> ExtauthAxumExt<M> for ExternalAuth<M> {
    fn axum_router<AppState>(&self) -> axum::Router<AppState>
    where
        AppState: Clone + Send + Sync + 'static,
        ExternalAuth<M>: FromRef<AppState>,
    {
        use axum::routing::get;
        axum::Router::new()
            .route("/authorize", get(helpers::axum_authorize_handler::<AppState, M>))
            .route(
                "/callback",
                get(helpers::axum_callback_handler::<AppState, M>)
                    .post(helpers::axum_callback_form_handler::<AppState, M>),
            )
    }
}
