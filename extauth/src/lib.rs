//! # Extauth
//!
//! Facade over the extauth crates. Enable the pieces you need with cargo features:
//!
//! - `flow`: the authorize/callback orchestration ([`flow`])
//! - `token`: the signed `state` codec ([`token`])
//! - `axum`: routes for axum ([`axum`])
//! - `descope`: the Descope adapter ([`providers::descope`]), registered by default in the flow
//! - `full`: all of the above

pub use extauth_core::*;

#[cfg(feature = "flow")]
pub use extauth_flow as flow;

#[cfg(feature = "flow")]
pub use extauth_flow::{ExternalAuth, FlowConfig, ProviderRegistry};

#[cfg(feature = "token")]
pub use extauth_token as token;

#[cfg(feature = "axum")]
pub use extauth_axum as axum;

/// Built-in provider adapters.
pub mod providers {
    #[cfg(feature = "descope")]
    pub use extauth_providers_descope as descope;
}
