use extauth_core::{AuthError, OAuthProvider, ProviderConfig};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a provider adapter from its configuration, request-time scopes and the shared HTTP client.
pub type ProviderConstructor = Arc<
    dyn Fn(&ProviderConfig, &str, &reqwest::Client) -> Result<Arc<dyn OAuthProvider>, AuthError>
        + Send
        + Sync,
>;

/// Maps provider names to adapter constructors.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in adapter enabled by cargo features.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "descope")]
        {
            use extauth_providers_descope::DescopeProvider;
            registry = registry.register(DescopeProvider::ID, |config, scopes, http| {
                let provider = DescopeProvider::new(config, scopes, http.clone())?;
                Ok(Arc::new(provider) as Arc<dyn OAuthProvider>)
            });
        }

        registry
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<F>(mut self, name: &str, constructor: F) -> Self
    where
        F: Fn(&ProviderConfig, &str, &reqwest::Client) -> Result<Arc<dyn OAuthProvider>, AuthError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(normalize(name), Arc::new(constructor));
        self
    }

    /// Whether a constructor exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize(name))
    }

    /// Registered provider names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build the adapter for `name` from `providers`.
    pub fn build(
        &self,
        name: &str,
        providers: &HashMap<String, ProviderConfig>,
        scopes: &str,
        http: &reqwest::Client,
    ) -> Result<Arc<dyn OAuthProvider>, AuthError> {
        let key = normalize(name);
        let constructor = self
            .constructors
            .get(&key)
            .ok_or_else(|| AuthError::UnknownProvider(name.to_string()))?;
        let config = providers
            .get(&key)
            .ok_or_else(|| AuthError::UnknownProvider(name.to_string()))?;

        constructor(config, scopes, http)
    }
}

/// Provider names are case-insensitive.
pub fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
