//! Resolution of credentials for a cluster.

use std::fmt;

use crate::error::{DeltaError, Result};
use crate::parameters::TokenProviderParameterization;

/// Identifies a cluster: its URI, trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterKey(String);

impl ClusterKey {
    #[must_use]
    pub fn new(cluster_uri: &str) -> Self {
        Self(cluster_uri.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to authenticate against one cluster.
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Service principal (AAD application key).
    ApplicationKey {
        client_id: String,
        secret: String,
        tenant_id: String,
    },
    /// Pre-acquired user token.
    UserToken(String),
}

impl Authentication {
    /// Resolves the credentials `provider` holds for `cluster`.
    ///
    /// A login applies to every cluster. Tokens apply to the cluster whose
    /// URI matches, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::NoToken`] when tokens are configured but none
    /// matches the cluster.
    pub fn resolve(provider: &TokenProviderParameterization, cluster: &ClusterKey) -> Result<Self> {
        if let Some(login) = &provider.login {
            return Ok(Self::ApplicationKey {
                client_id: login.client_id.clone(),
                secret: login.secret.clone(),
                tenant_id: login.tenant_id.clone(),
            });
        }
        provider
            .tokens
            .iter()
            .flat_map(|tokens| tokens.values())
            .find(|t| ClusterKey::new(&t.cluster_uri) == *cluster)
            .map(|t| Self::UserToken(t.token.clone()))
            .ok_or_else(|| DeltaError::NoToken(cluster.to_string()))
    }

    /// Short label, safe to log.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ApplicationKey { .. } => "application key",
            Self::UserToken(_) => "user token",
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApplicationKey {
                client_id,
                tenant_id,
                ..
            } => f
                .debug_struct("ApplicationKey")
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .finish_non_exhaustive(),
            Self::UserToken(_) => f.write_str("UserToken(***)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::parameters::{ServicePrincipalLoginParameterization, TokenParameterization};

    fn tokens(entries: &[(&str, &str)]) -> TokenProviderParameterization {
        let tokens: IndexMap<_, _> = entries
            .iter()
            .enumerate()
            .map(|(i, (uri, token))| {
                (
                    format!("token{i}"),
                    TokenParameterization {
                        cluster_uri: (*uri).to_string(),
                        token: (*token).to_string(),
                    },
                )
            })
            .collect();
        TokenProviderParameterization {
            login: None,
            tokens: Some(tokens),
        }
    }

    #[test]
    fn test_cluster_key_normalization() {
        assert_eq!(
            ClusterKey::new("  https://MyCluster.kusto.windows.net "),
            ClusterKey::new("https://mycluster.kusto.windows.net")
        );
    }

    #[test]
    fn test_token_matches_cluster_uri() {
        let provider = tokens(&[
            ("https://a.kusto.windows.net", "token-a"),
            (" HTTPS://B.kusto.windows.net", "token-b"),
        ]);
        let auth =
            Authentication::resolve(&provider, &ClusterKey::new("https://b.kusto.windows.net"))
                .unwrap();
        assert_eq!(auth, Authentication::UserToken(String::from("token-b")));
    }

    #[test]
    fn test_missing_token() {
        let provider = tokens(&[("https://a.kusto.windows.net", "token-a")]);
        let err = Authentication::resolve(&provider, &ClusterKey::new("https://c.kusto.windows.net"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No token was provided for https://c.kusto.windows.net"
        );
    }

    #[test]
    fn test_login_applies_to_every_cluster() {
        let provider = TokenProviderParameterization {
            login: Some(ServicePrincipalLoginParameterization {
                client_id: String::from("app"),
                secret: String::from("s3cret"),
                tenant_id: String::from("tenant"),
            }),
            tokens: None,
        };
        let auth = Authentication::resolve(&provider, &ClusterKey::new("https://x")).unwrap();
        assert_eq!(auth.kind(), "application key");
        assert!(!format!("{auth:?}").contains("s3cret"));
    }
}
