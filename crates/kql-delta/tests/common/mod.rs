//! Shared helpers for kql-delta integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;

use kql_delta::prelude::*;

pub const CLUSTER: &str = "https://test.kusto.windows.net";

/// Connector backed by in-memory databases.
///
/// Counts connections, records executed commands and fails any command
/// containing `reject`.
#[derive(Default)]
pub struct RecordingConnector {
    pub connections: AtomicUsize,
    pub connect_delay: Option<Duration>,
    pub schemas: HashMap<String, String>,
    pub executed: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingConnector {
    pub fn with_schema(mut self, database: &str, script: &str) -> Self {
        self.schemas.insert(database.to_string(), script.to_string());
        self
    }

    pub fn executed(&self) -> Vec<(String, String)> {
        self.executed.lock().unwrap().clone()
    }
}

pub struct RecordingProvider {
    pub schemas: HashMap<String, String>,
    pub executed: Arc<Mutex<Vec<(String, String)>>>,
}

struct RecordingGateway {
    provider: Arc<RecordingProvider>,
    cluster: ClusterKey,
    database: String,
}

impl ProviderConnector for RecordingConnector {
    type Provider = RecordingProvider;

    fn connect(&self, _cluster: &ClusterKey, _authentication: &Authentication) -> Result<Self::Provider> {
        if let Some(delay) = self.connect_delay {
            std::thread::sleep(delay);
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingProvider {
            schemas: self.schemas.clone(),
            executed: Arc::clone(&self.executed),
        })
    }

    fn gateway(
        &self,
        provider: Arc<Self::Provider>,
        cluster: ClusterKey,
        database: String,
    ) -> Box<dyn ManagementGateway> {
        Box::new(RecordingGateway {
            provider,
            cluster,
            database,
        })
    }
}

impl ManagementGateway for RecordingGateway {
    fn cluster(&self) -> &ClusterKey {
        &self.cluster
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn fetch_schema_script(&self) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            Ok(self
                .provider
                .schemas
                .get(&self.database)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn execute_commands<'a>(
        &'a self,
        commands: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<CommandResult>>> {
        Box::pin(async move {
            let mut results = Vec::new();
            for command in commands {
                if command.contains("reject") {
                    results.push(CommandResult::failure(command.as_str(), "Rejected"));
                    break;
                }
                self.provider
                    .executed
                    .lock()
                    .unwrap()
                    .push((self.database.clone(), command.clone()));
                results.push(CommandResult::success(command.as_str()));
            }
            Ok(results)
        })
    }
}

pub fn token_parameters(yaml_jobs: &str) -> String {
    format!(
        "tokenProvider:\n  tokens:\n    main:\n      clusterUri: {CLUSTER}\n      token: abc\n{yaml_jobs}"
    )
}

pub fn write(dir: &Path, relative: &str, text: &str) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

pub fn read(dir: &Path, relative: &str) -> String {
    std::fs::read_to_string(dir.join(relative)).unwrap()
}

/// Drops comment and blank lines, leaving the statements.
pub fn statements(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with("//"))
        .collect()
}
