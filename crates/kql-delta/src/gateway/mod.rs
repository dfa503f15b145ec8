//! Access to live clusters.
//!
//! The job runner never talks to a cluster directly. It asks a
//! [`GatewayFactory`] for a [`ManagementGateway`] bound to one database, and
//! the factory builds it through a [`ProviderConnector`]. Connectors own the
//! transport; the bundled [`DryRunConnector`] only logs.

mod dry_run;
mod factory;
mod token;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;

pub use dry_run::{DryRunConnector, DryRunGateway, DryRunProvider};
pub use factory::GatewayFactory;
pub use token::{Authentication, ClusterKey};

/// Result of executing a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    pub outcome: CommandOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// The cluster rejected the command with this diagnostic.
    Failure(String),
}

impl CommandResult {
    #[must_use]
    pub fn success(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            outcome: CommandOutcome::Success,
        }
    }

    #[must_use]
    pub fn failure(command: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            outcome: CommandOutcome::Failure(diagnostic.into()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Success)
    }
}

/// Management endpoint of one database.
pub trait ManagementGateway: Send + Sync {
    /// Cluster this gateway talks to.
    fn cluster(&self) -> &ClusterKey;

    /// Database commands run against.
    fn database(&self) -> &str;

    /// Returns the database schema as a script of control commands.
    fn fetch_schema_script(&self) -> BoxFuture<'_, Result<String>>;

    /// Executes `commands` in order, reporting one result per command.
    ///
    /// Execution stops at the first failure; the returned list then ends
    /// with that failure.
    fn execute_commands<'a>(
        &'a self,
        commands: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<CommandResult>>>;
}

/// Builds cluster connections and the gateways that use them.
///
/// A provider holds the connection to a cluster and is shared by every
/// gateway on that cluster.
pub trait ProviderConnector: Send + Sync {
    type Provider: Send + Sync + 'static;

    /// Opens a connection to `cluster`.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection can't be established.
    fn connect(&self, cluster: &ClusterKey, authentication: &Authentication)
        -> Result<Self::Provider>;

    /// Binds a provider to `database`.
    fn gateway(
        &self,
        provider: Arc<Self::Provider>,
        cluster: ClusterKey,
        database: String,
    ) -> Box<dyn ManagementGateway>;
}
