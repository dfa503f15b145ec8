//! Parameter file model.
//!
//! A parameter file is YAML describing one or more jobs:
//!
//! ```yaml
//! failIfDataLoss: true
//! jobs:
//!   main:
//!     current:
//!       adx:
//!         clusterUri: https://mycluster.kusto.windows.net
//!         database: prod
//!     target:
//!       scripts:
//!         - folderPath: schema
//!     action:
//!       filePath: delta.kql
//!       pushToCurrent: false
//! tokenProvider:
//!   login:
//!     clientId: ...
//!     secret: ...
//!     tenantId: ...
//! ```
//!
//! Values can be overridden from the command line with dotted paths, e.g.
//! `jobs.main.current.adx.database=staging`.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{DeltaError, Result};

/// Root of a parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MainParameterization {
    /// Fail a job whose delta drops tables or columns or alters a column
    /// type.
    #[serde(default)]
    pub fail_if_data_loss: bool,
    /// Credentials used for every cluster the jobs reach.
    #[serde(default)]
    pub token_provider: Option<TokenProviderParameterization>,
    /// Jobs, run in file order.
    #[serde(default)]
    pub jobs: IndexMap<String, JobParameterization>,
}

/// One current/target comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobParameterization {
    /// Absent means an empty database.
    #[serde(default)]
    pub current: Option<SourceParameterization>,
    /// Absent means an empty database.
    #[serde(default)]
    pub target: Option<SourceParameterization>,
    #[serde(default)]
    pub action: Option<ActionParameterization>,
}

/// Where a schema comes from: script files or a live database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceParameterization {
    #[serde(default)]
    pub scripts: Option<Vec<SourceFileParameterization>>,
    #[serde(default)]
    pub adx: Option<AdxSourceParameterization>,
}

/// A single script file or a folder of `.kql` files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceFileParameterization {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub folder_path: Option<String>,
}

/// A database on a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdxSourceParameterization {
    pub cluster_uri: String,
    pub database: String,
}

/// What to do with a computed delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionParameterization {
    /// Write the whole delta to this file.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Write the delta to this folder, one file per command kind and entity.
    #[serde(default)]
    pub folder_path: Option<String>,
    /// Database-level commands name the target database instead of the
    /// current one.
    #[serde(default)]
    pub use_target_database_name: bool,
    /// Execute the delta on the current database.
    #[serde(default)]
    pub push_to_current: bool,
}

/// Credentials, as a service principal login or as pre-acquired tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenProviderParameterization {
    #[serde(default)]
    pub login: Option<ServicePrincipalLoginParameterization>,
    /// Tokens keyed by an arbitrary name.
    #[serde(default)]
    pub tokens: Option<IndexMap<String, TokenParameterization>>,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServicePrincipalLoginParameterization {
    pub client_id: String,
    pub secret: String,
    pub tenant_id: String,
}

impl std::fmt::Debug for ServicePrincipalLoginParameterization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipalLoginParameterization")
            .field("client_id", &self.client_id)
            .field("secret", &"***")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenParameterization {
    pub cluster_uri: String,
    pub token: String,
}

impl std::fmt::Debug for TokenParameterization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenParameterization")
            .field("cluster_uri", &self.cluster_uri)
            .field("token", &"***")
            .finish()
    }
}

impl MainParameterization {
    /// Parses a parameter file, applies `path=value` overrides and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML, unknown fields, malformed
    /// overrides, or jobs that fail [`validate`](Self::validate).
    pub fn from_yaml<S: AsRef<str>>(text: &str, overrides: &[S]) -> Result<Self> {
        let mut document: Value = if text.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            serde_yaml::from_str(text)?
        };
        for item in overrides {
            let (path, value) = parse_override(item.as_ref())?;
            apply_override(&mut document, path, value)?;
        }
        let parameters: Self = serde_yaml::from_value(document)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Reads and parses a parameter file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or fails
    /// [`from_yaml`](Self::from_yaml).
    pub fn from_file<S: AsRef<str>>(path: &Path, overrides: &[S]) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DeltaError::io(path, e))?;
        Self::from_yaml(&text, overrides)
    }

    /// Checks cross-field constraints serde can't express.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::InvalidParameters`] naming the offending job.
    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(invalid("no job is defined"));
        }
        if let Some(provider) = &self.token_provider {
            provider.validate()?;
        }
        for (name, job) in &self.jobs {
            job.validate()
                .map_err(|message| invalid(format!("job '{name}': {message}")))?;
        }
        Ok(())
    }
}

impl JobParameterization {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(current) = &self.current {
            current.validate().map_err(|m| format!("current: {m}"))?;
        }
        if let Some(target) = &self.target {
            target.validate().map_err(|m| format!("target: {m}"))?;
        }
        let Some(action) = &self.action else {
            return Err(String::from("an action is required"));
        };
        if action.file_path.is_some() && action.folder_path.is_some() {
            return Err(String::from(
                "action can't have both 'filePath' and 'folderPath'",
            ));
        }
        if action.file_path.is_none() && action.folder_path.is_none() && !action.push_to_current {
            return Err(String::from(
                "action must write a file, a folder or push to current",
            ));
        }
        if action.push_to_current && !self.current.as_ref().is_some_and(|c| c.adx.is_some()) {
            return Err(String::from("'pushToCurrent' requires an adx current source"));
        }
        if action.use_target_database_name
            && !self.target.as_ref().is_some_and(|t| t.adx.is_some())
        {
            return Err(String::from(
                "'useTargetDatabaseName' requires an adx target source",
            ));
        }
        Ok(())
    }
}

impl SourceParameterization {
    fn validate(&self) -> std::result::Result<(), String> {
        match (&self.scripts, &self.adx) {
            (Some(_), Some(_)) => Err(String::from("can't have both 'scripts' and 'adx'")),
            (None, None) => Err(String::from("must have 'scripts' or 'adx'")),
            (Some(scripts), None) => scripts.iter().try_for_each(|script| {
                match (&script.file_path, &script.folder_path) {
                    (Some(_), None) | (None, Some(_)) => Ok(()),
                    _ => Err(String::from(
                        "each script needs exactly one of 'filePath' or 'folderPath'",
                    )),
                }
            }),
            (None, Some(adx)) => {
                if adx.cluster_uri.trim().is_empty() || adx.database.trim().is_empty() {
                    Err(String::from("adx needs 'clusterUri' and 'database'"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl TokenProviderParameterization {
    fn validate(&self) -> Result<()> {
        match (&self.login, &self.tokens) {
            (Some(_), Some(_)) => Err(invalid(
                "tokenProvider can't have both 'login' and 'tokens'",
            )),
            (None, None) => Err(invalid("tokenProvider needs 'login' or 'tokens'")),
            _ => Ok(()),
        }
    }
}

fn invalid(message: impl Into<String>) -> DeltaError {
    DeltaError::InvalidParameters(message.into())
}

/// Splits `path=value` at the first `=`.
///
/// # Errors
///
/// Returns [`DeltaError::InvalidOverride`] when there is no `=` or the path
/// is empty.
pub fn parse_override(item: &str) -> Result<(&str, &str)> {
    match item.split_once('=') {
        Some((path, value)) if !path.trim().is_empty() => Ok((path.trim(), value)),
        _ => Err(DeltaError::InvalidOverride(item.to_string())),
    }
}

/// Sets `value` at the dotted `path`, creating intermediate mappings.
fn apply_override(document: &mut Value, path: &str, value: &str) -> Result<()> {
    let mut node = document;
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(DeltaError::InvalidOverride(format!("{path}={value}")));
        }
        if node.is_null() {
            *node = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = node else {
            return Err(invalid(format!(
                "override '{path}' goes through a value that isn't a mapping"
            )));
        };
        node = map
            .entry(Value::String(segment.to_string()))
            .or_insert(Value::Null);
    }
    *node = scalar(value);
    Ok(())
}

fn scalar(value: &str) -> Value {
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value.to_string()),
    }
}
