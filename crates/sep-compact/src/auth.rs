//! Bearer token authentication for HTTP gateways.
//!
//! Public gateways need no credentials. Private gateways and pinning
//! services accept a bearer token, taken from configuration or from
//! `SEP_GATEWAY_TOKEN`.

/// Token provider for gateway authentication.
#[derive(Debug, Clone, Default)]
pub enum TokenProvider {
    /// Static token (from config or env).
    Static(String),

    /// No authentication.
    #[default]
    None,
}

impl TokenProvider {
    /// Create a static token provider.
    pub fn static_token(token: impl Into<String>) -> Self {
        Self::Static(token.into())
    }

    /// Create from the `SEP_GATEWAY_TOKEN` environment variable.
    ///
    /// An unset or empty variable means no authentication.
    pub fn from_env() -> Self {
        match std::env::var("SEP_GATEWAY_TOKEN") {
            Ok(token) if !token.is_empty() => Self::Static(token),
            _ => Self::None,
        }
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Static(token) => Some(token),
            Self::None => None,
        }
    }

    /// Whether requests carry credentials.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}
