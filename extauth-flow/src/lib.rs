//! # Extauth Flow
//!
//! `extauth-flow` drives the two halves of an external sign-in: the authorize redirect and the
//! callback exchange. It is the bridge between the provider adapters from `extauth-core` and
//! the framework-specific integrations.
//!
//! ## Key Components
//!
//! - **[`ExternalAuth`]**: The service holding configuration, the state codec and the provider registry.
//! - **[`ExternalAuthBuilder`]**: A builder for configuring and creating an [`ExternalAuth`] instance.
//! - **[`ProviderRegistry`]**: Maps provider names to adapter constructors.
//! - **[`FlowConfig`]**: Process-wide settings, loadable from the environment.
//!
//! No server-side state is kept between the two halves: everything the callback needs travels
//! inside the signed `state` parameter.

#![warn(missing_docs)]

use extauth_core::{AccountLinker, AuthError, OAuthProvider};
use extauth_token::StateCodec;
use std::sync::Arc;

/// Process-wide flow configuration.
pub mod config;
/// Provider name to adapter constructor mapping.
pub mod registry;
/// The authorize redirect.
pub mod authorize;
/// The callback exchange.
pub mod callback;

pub use authorize::{AuthorizeRedirect, AuthorizeRequest};
pub use callback::{CallbackOutcome, CallbackRequest, CallbackStage};
pub use config::FlowConfig;
pub use registry::{ProviderConstructor, ProviderRegistry};

pub use chrono;

/// The external sign-in service.
///
/// Cheap to clone; every clone shares the same configuration, codec, registry and HTTP client.
pub struct ExternalAuth<M: AccountLinker = ()> {
    registry: Arc<ProviderRegistry>,
    config: Arc<FlowConfig>,
    codec: Arc<StateCodec>,
    http: reqwest::Client,
    linker: Arc<M>,
}

impl<M: AccountLinker> Clone for ExternalAuth<M> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            config: self.config.clone(),
            codec: self.codec.clone(),
            http: self.http.clone(),
            linker: self.linker.clone(),
        }
    }
}

impl ExternalAuth<()> {
    /// Create a new [`ExternalAuthBuilder`] to configure the service.
    pub fn builder(config: FlowConfig) -> ExternalAuthBuilder<()> {
        ExternalAuthBuilder {
            config,
            registry: None,
            http: None,
            linker: (),
        }
    }
}

impl<M: AccountLinker> ExternalAuth<M> {
    /// The configuration the service was built with.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// The codec signing and verifying `state`.
    pub fn codec(&self) -> &StateCodec {
        &self.codec
    }

    /// The account-linking hand-off.
    pub fn linker(&self) -> &M {
        &self.linker
    }

    /// Build the adapter for `name` with request-time `scopes`.
    pub fn provider(&self, name: &str, scopes: &str) -> Result<Arc<dyn OAuthProvider>, AuthError> {
        self.registry
            .build(name, &self.config.providers, scopes, &self.http)
    }
}

/// A builder for configuring and creating an [`ExternalAuth`] instance.
pub struct ExternalAuthBuilder<M> {
    config: FlowConfig,
    registry: Option<ProviderRegistry>,
    http: Option<reqwest::Client>,
    linker: M,
}

impl<M: AccountLinker + 'static> ExternalAuthBuilder<M> {
    /// Use `registry` instead of [`ProviderRegistry::with_defaults`].
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a preconfigured HTTP client instead of one built from the configured timeout.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Hand successful sign-ins to `linker`.
    pub fn linker<L: AccountLinker + 'static>(self, linker: L) -> ExternalAuthBuilder<L> {
        ExternalAuthBuilder {
            config: self.config,
            registry: self.registry,
            http: self.http,
            linker,
        }
    }

    /// Validate the configuration and build the service.
    pub fn build(self) -> Result<ExternalAuth<M>, AuthError> {
        self.config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.config.http_timeout())
                .build()
                .map_err(|e| AuthError::ConfigInvalid(format!("failed to build HTTP client: {e}")))?,
        };

        let codec = StateCodec::new(self.config.jwt_secret.as_bytes(), self.config.state_ttl());

        tracing::debug!(
            providers = self.config.providers.len(),
            ttl_secs = self.config.state_ttl_secs,
            "external auth service configured"
        );

        Ok(ExternalAuth {
            registry: Arc::new(self.registry.unwrap_or_else(ProviderRegistry::with_defaults)),
            config: Arc::new(self.config),
            codec: Arc::new(codec),
            http,
            linker: Arc::new(self.linker),
        })
    }
}
