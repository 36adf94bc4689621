//! # Axum Descope Example
//!
//! Signs users in through Descope and prints the normalized identity.
//!
//! Configure through the environment (or a `.env` file):
//!
//! ```text
//! EXTAUTH_JWT_SECRET=change-me
//! EXTAUTH_SITE_URL=http://localhost:3000
//! EXTAUTH_EXTERNAL_DESCOPE_CLIENT_ID=<client id>
//! EXTAUTH_EXTERNAL_DESCOPE_SECRET=<client secret>
//! EXTAUTH_EXTERNAL_DESCOPE_REDIRECT_URI=http://localhost:3000/callback
//! EXTAUTH_EXTERNAL_DESCOPE_URL=https://api.descope.com/<project id>
//! ```
//!
//! Then open <http://localhost:3000>.

use async_trait::async_trait;
use axum::{response::Html, routing::get, Router};
use extauth::axum::ExtauthAxumExt;
use extauth::{AccountLinker, AuthError, ExternalAuth, FlowConfig, StateClaims, UserProvidedData};
use tracing_subscriber::EnvFilter;

/// Accepts every identity and logs it; a real service would look up or create the account here.
struct LoggingLinker;

#[async_trait]
impl AccountLinker for LoggingLinker {
    type LocalUser = String;

    async fn link(
        &self,
        data: &UserProvidedData,
        claims: &StateClaims,
    ) -> Result<Self::LocalUser, AuthError> {
        tracing::info!(
            provider = %claims.provider,
            subject = %data.metadata.subject,
            email = ?data.primary_email().map(|e| e.email.as_str()),
            invite = ?claims.invite_token,
            "signed in"
        );
        Ok(data.metadata.subject.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,extauth=debug")),
        )
        .init();

    let config = FlowConfig::from_env(&["descope"])?;
    let auth = ExternalAuth::builder(config).linker(LoggingLinker).build()?;

    let app = Router::new()
        .route("/", get(index))
        .merge(auth.axum_router::<ExternalAuth<LoggingLinker>>())
        .with_state(auth);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on http://0.0.0.0:3000");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(
        "<h1>extauth Descope example</h1>\
         <a href=\"/authorize?provider=descope\">Sign in with Descope</a>",
    )
}
