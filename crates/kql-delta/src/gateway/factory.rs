//! Gateway factory with a per-cluster provider cache.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::{Authentication, ClusterKey, ManagementGateway, ProviderConnector};
use crate::error::{DeltaError, Result};
use crate::parameters::TokenProviderParameterization;

/// Creates gateways, connecting to each cluster at most once.
///
/// Providers hold connections, so one is kept per cluster for the life of
/// the factory and shared by every gateway on that cluster.
pub struct GatewayFactory<C: ProviderConnector> {
    connector: C,
    token_provider: Option<TokenProviderParameterization>,
    providers: RwLock<HashMap<ClusterKey, Arc<C::Provider>>>,
}

impl<C: ProviderConnector> GatewayFactory<C> {
    #[must_use]
    pub fn new(connector: C, token_provider: Option<TokenProviderParameterization>) -> Self {
        Self {
            connector,
            token_provider,
            providers: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Number of clusters connected so far.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns a gateway to `database` on `cluster_uri`.
    ///
    /// # Errors
    ///
    /// Returns an error when no credentials match the cluster or the
    /// connector fails to connect.
    pub fn create_gateway(
        &self,
        cluster_uri: &str,
        database: &str,
    ) -> Result<Box<dyn ManagementGateway>> {
        let cluster = ClusterKey::new(cluster_uri);
        let provider = self.provider(&cluster)?;
        Ok(self
            .connector
            .gateway(provider, cluster, database.trim().to_string()))
    }

    fn provider(&self, cluster: &ClusterKey) -> Result<Arc<C::Provider>> {
        let cached = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(cluster)
            .cloned();
        if let Some(provider) = cached {
            return Ok(provider);
        }

        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another caller may have connected while we waited for the lock
        if let Some(provider) = providers.get(cluster) {
            debug!(%cluster, "Provider created concurrently");
            return Ok(Arc::clone(provider));
        }
        let token_provider = self
            .token_provider
            .as_ref()
            .ok_or_else(|| DeltaError::NoTokenProvider(cluster.to_string()))?;
        let authentication = Authentication::resolve(token_provider, cluster)?;
        info!(%cluster, authentication = authentication.kind(), "Connecting to cluster");
        let provider = Arc::new(self.connector.connect(cluster, &authentication)?);
        providers.insert(cluster.clone(), Arc::clone(&provider));
        Ok(provider)
    }
}
