//! Connector that logs commands instead of sending them.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use super::{Authentication, ClusterKey, CommandResult, ManagementGateway, ProviderConnector};
use crate::error::Result;

/// Connector whose gateways log every command and report success.
///
/// Databases read through it are empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunConnector;

impl DryRunConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
pub struct DryRunProvider {
    authentication: &'static str,
}

impl DryRunProvider {
    #[must_use]
    pub const fn authentication(&self) -> &'static str {
        self.authentication
    }
}

pub struct DryRunGateway {
    provider: Arc<DryRunProvider>,
    cluster: ClusterKey,
    database: String,
}

impl ProviderConnector for DryRunConnector {
    type Provider = DryRunProvider;

    fn connect(
        &self,
        cluster: &ClusterKey,
        authentication: &Authentication,
    ) -> Result<Self::Provider> {
        info!(%cluster, "Dry run: no connection is opened");
        Ok(DryRunProvider {
            authentication: authentication.kind(),
        })
    }

    fn gateway(
        &self,
        provider: Arc<Self::Provider>,
        cluster: ClusterKey,
        database: String,
    ) -> Box<dyn ManagementGateway> {
        Box::new(DryRunGateway {
            provider,
            cluster,
            database,
        })
    }
}

impl ManagementGateway for DryRunGateway {
    fn cluster(&self) -> &ClusterKey {
        &self.cluster
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn fetch_schema_script(&self) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            warn!(
                cluster = %self.cluster,
                database = %self.database,
                "Dry run: database is read as empty"
            );
            Ok(String::new())
        })
    }

    fn execute_commands<'a>(
        &'a self,
        commands: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<CommandResult>>> {
        Box::pin(async move {
            Ok(commands
                .iter()
                .map(|command| {
                    info!(
                        cluster = %self.cluster,
                        database = %self.database,
                        authentication = self.provider.authentication(),
                        "Dry run:\n{command}"
                    );
                    CommandResult::success(command.as_str())
                })
                .collect())
        })
    }
}
