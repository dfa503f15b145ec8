//! Job runner.
//!
//! Each job loads its current and target schemas, reconciles them, then
//! writes the delta to files and/or pushes it to the current database.

use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;
use kql_delta_core::{
    parse_script, Command, CommandKind, EntityName, EntityType, Reconciler, ScriptRenderer,
    ScriptingContext,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DeltaError, Result};
use crate::gateway::{CommandOutcome, GatewayFactory, ProviderConnector};
use crate::parameters::{
    ActionParameterization, JobParameterization, MainParameterization, SourceFileParameterization,
    SourceParameterization,
};

/// Outcome of one job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub job: String,
    #[serde(skip)]
    pub delta: Vec<Command>,
    /// Delta statements as sent to the cluster.
    pub statements: Vec<String>,
    /// Whether the delta drops tables or columns or alters a column type.
    pub data_loss: bool,
    /// Files written, in write order.
    pub files: Vec<PathBuf>,
    /// Number of statements executed on the current database.
    pub pushed: usize,
}

/// Runs the jobs of a parameter file.
pub struct DeltaRunner<C: ProviderConnector> {
    parameters: MainParameterization,
    base_dir: PathBuf,
    factory: GatewayFactory<C>,
    reconciler: Reconciler,
}

impl<C: ProviderConnector> DeltaRunner<C> {
    /// Creates a runner. Relative paths in `parameters` resolve against
    /// `base_dir`.
    #[must_use]
    pub fn new(parameters: MainParameterization, base_dir: impl Into<PathBuf>, connector: C) -> Self {
        let factory = GatewayFactory::new(connector, parameters.token_provider.clone());
        Self {
            parameters,
            base_dir: base_dir.into(),
            factory,
            reconciler: Reconciler::new(),
        }
    }

    /// Replaces the default reconciler.
    #[must_use]
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    #[must_use]
    pub const fn factory(&self) -> &GatewayFactory<C> {
        &self.factory
    }

    /// Runs every job in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first job's error.
    pub async fn run(&self) -> Result<Vec<JobReport>> {
        let mut reports = Vec::with_capacity(self.parameters.jobs.len());
        for (name, job) in &self.parameters.jobs {
            reports.push(self.run_job(name, job).await?);
        }
        Ok(reports)
    }

    /// Runs a single job.
    ///
    /// # Errors
    ///
    /// Returns an error when a source can't be loaded or parsed, the schemas
    /// can't be reconciled, the data-loss guard trips, an action fails, or
    /// the cluster rejects a pushed command.
    pub async fn run_job(&self, name: &str, job: &JobParameterization) -> Result<JobReport> {
        let Some(action) = &job.action else {
            return Err(DeltaError::InvalidParameters(format!(
                "job '{name}' has no action"
            )));
        };
        info!(job = name, "Running job");

        let (current, target) = futures::try_join!(
            self.load_source(job.current.as_ref()),
            self.load_source(job.target.as_ref()),
        )?;
        debug!(
            job = name,
            current = current.len(),
            target = target.len(),
            "Schemas loaded"
        );

        let database = delta_database(job, action);
        let mut delta = self.reconciler.reconcile(&current, &target)?;
        if let Some(database) = &database {
            delta = retarget(delta, database);
        }
        let lossy: Vec<String> = delta
            .iter()
            .filter(|command| command.kind().loses_data())
            .map(|command| format!("{} {}", command.friendly_name(), command.entity_name()))
            .collect();
        if !lossy.is_empty() {
            if self.parameters.fail_if_data_loss {
                return Err(DeltaError::DataLoss {
                    job: name.to_string(),
                    commands: lossy,
                });
            }
            warn!(job = name, commands = ?lossy, "Delta loses data");
        }

        let context = database.map_or_else(ScriptingContext::new, ScriptingContext::from);
        let statements: Vec<String> = delta.iter().map(|c| c.to_script(&context)).collect();
        let mut report = JobReport {
            job: name.to_string(),
            statements,
            data_loss: !lossy.is_empty(),
            files: Vec::new(),
            pushed: 0,
            delta,
        };

        if let Some(file_path) = &action.file_path {
            let path = self.resolve(file_path);
            let renderer = ScriptRenderer::new(context.clone()).with_headers();
            let text = format!("{}{}", file_header(name), renderer.render(&report.delta));
            write_file(&path, &text).await?;
            report.files.push(path);
        }
        if let Some(folder_path) = &action.folder_path {
            let folder = self.resolve(folder_path);
            let written = write_folder(&folder, name, &report.delta, &context).await?;
            report.files.extend(written);
        }
        if action.push_to_current {
            report.pushed = self.push(job, &report.statements).await?;
        }

        info!(
            job = name,
            commands = report.delta.len(),
            files = report.files.len(),
            pushed = report.pushed,
            "Job completed"
        );
        Ok(report)
    }

    async fn load_source(&self, source: Option<&SourceParameterization>) -> Result<Vec<Command>> {
        let Some(source) = source else {
            return Ok(Vec::new());
        };
        if let Some(adx) = &source.adx {
            let gateway = self
                .factory
                .create_gateway(&adx.cluster_uri, &adx.database)?;
            let script = gateway.fetch_schema_script().await?;
            let origin = format!("{}/{}", gateway.cluster(), gateway.database());
            return parse(&script, origin);
        }
        let mut commands = Vec::new();
        for file in source.scripts.iter().flatten() {
            commands.extend(self.load_script_file(file).await?);
        }
        Ok(commands)
    }

    async fn load_script_file(&self, file: &SourceFileParameterization) -> Result<Vec<Command>> {
        match (&file.file_path, &file.folder_path) {
            (Some(path), None) | (None, Some(path)) => load_script_path(&self.resolve(path)).await,
            _ => Err(DeltaError::InvalidParameters(String::from(
                "each script needs exactly one of 'filePath' or 'folderPath'",
            ))),
        }
    }

    async fn push(&self, job: &JobParameterization, statements: &[String]) -> Result<usize> {
        let Some(adx) = job.current.as_ref().and_then(|c| c.adx.as_ref()) else {
            return Err(DeltaError::InvalidParameters(String::from(
                "'pushToCurrent' requires an adx current source",
            )));
        };
        if statements.is_empty() {
            return Ok(0);
        }
        let gateway = self
            .factory
            .create_gateway(&adx.cluster_uri, &adx.database)?;
        info!(
            cluster = %gateway.cluster(),
            database = gateway.database(),
            count = statements.len(),
            "Pushing delta"
        );
        let results = gateway.execute_commands(statements).await?;
        let mut pushed = 0;
        for result in results {
            match result.outcome {
                CommandOutcome::Success => pushed += 1,
                CommandOutcome::Failure(diagnostic) => {
                    return Err(DeltaError::CommandFailed {
                        cluster: gateway.cluster().to_string(),
                        command: result.command,
                        diagnostic,
                    })
                }
            }
        }
        Ok(pushed)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}

/// Loads a script file, or every `.kql` file under a folder in path order.
///
/// # Errors
///
/// Returns an error when a file can't be read or holds an invalid script.
pub async fn load_script_path(path: &Path) -> Result<Vec<Command>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| DeltaError::io(path, e))?;
    let files = if metadata.is_dir() {
        kql_files(path).await?
    } else {
        vec![path.to_path_buf()]
    };
    let mut commands = Vec::new();
    for file in files {
        let text = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| DeltaError::io(&file, e))?;
        debug!(path = %file.display(), "Parsing script");
        commands.extend(parse(&text, file.display().to_string())?);
    }
    Ok(commands)
}

/// Lists `.kql` files under `folder`, recursively, sorted by path.
async fn kql_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![folder.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| DeltaError::io(&dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DeltaError::io(&dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| DeltaError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "kql") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn parse(script: &str, origin: String) -> Result<Vec<Command>> {
    parse_script(script).map_err(|source| DeltaError::Script { origin, source })
}

/// The database the delta is meant for: the target's with
/// `useTargetDatabaseName`, otherwise the current one. Only live sources
/// name a database.
fn delta_database(job: &JobParameterization, action: &ActionParameterization) -> Option<EntityName> {
    let source = if action.use_target_database_name {
        &job.target
    } else {
        &job.current
    };
    source
        .as_ref()
        .and_then(|s| s.adx.as_ref())
        .map(|adx| EntityName::new(adx.database.as_str()))
}

/// Points database-scoped policy commands at `database`.
fn retarget(delta: Vec<Command>, database: &EntityName) -> Vec<Command> {
    delta
        .into_iter()
        .map(|command| command.with_database(database))
        .collect()
}

fn file_header(job: &str) -> String {
    format!(
        "// Generated by kql-delta for job '{job}' on {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Writes one file per command kind and entity, under
/// `<folder>/<entities>/<action>/<name>.kql`.
async fn write_folder(
    folder: &Path,
    job: &str,
    delta: &[Command],
    context: &ScriptingContext,
) -> Result<Vec<PathBuf>> {
    let mut groups: IndexMap<PathBuf, Vec<Command>> = IndexMap::new();
    for command in delta {
        let path = folder
            .join(folder_for(command))
            .join(format!("{}.kql", file_stem(command.entity_name().name())));
        groups.entry(path).or_default().push(command.clone());
    }
    let renderer = ScriptRenderer::new(context.clone());
    let mut files = Vec::with_capacity(groups.len());
    for (path, commands) in groups {
        let text = format!("{}{}", file_header(job), renderer.render(&commands));
        write_file(&path, &text).await?;
        files.push(path);
    }
    Ok(files)
}

fn folder_for(command: &Command) -> PathBuf {
    let entities = match command.entity_type() {
        EntityType::Database => "databases",
        EntityType::Function => "functions",
        _ => "tables",
    };
    let action = match command.kind() {
        CommandKind::CreateTable => "create",
        CommandKind::AlterMergeTableColumns => "alter-merge",
        CommandKind::DropTable | CommandKind::DropFunction => "drop",
        CommandKind::DropTableColumns => "columns/drop",
        CommandKind::AlterColumnType => "columns/alter-type",
        CommandKind::CreateFunction => "create-or-alter",
        CommandKind::AlterRetentionPolicy => "policies/retention/alter",
        CommandKind::DeleteRetentionPolicy => "policies/retention/delete",
        CommandKind::AlterIngestionBatchingPolicy => "policies/ingestionbatching/alter",
        CommandKind::DeleteIngestionBatchingPolicy => "policies/ingestionbatching/delete",
    };
    Path::new(entities).join(action)
}

/// Keeps entity names usable as file names.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DeltaError::io(parent, e))?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|e| DeltaError::io(path, e))?;
    debug!(path = %path.display(), "Wrote delta file");
    Ok(())
}
