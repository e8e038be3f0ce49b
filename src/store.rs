use crate::{CronExpression, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Severity taxonomy for job log writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// The job ran to completion.
    Success,
    /// Informational message.
    Info,
    /// Something looks off but the job keeps running.
    Warning,
    /// The job failed.
    Error,
    /// The job failed and the host should intervene.
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Success => "success",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// In-process job body.
pub type Callable = Arc<dyn Fn() -> std::result::Result<(), String> + Send + Sync>;

/// What a job runs when it is due.
#[derive(Clone)]
pub enum JobAction {
    /// A shell command line.
    Shell(String),
    /// An in-process callable.
    Callable(Callable),
}

impl fmt::Debug for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobAction::Shell(command) => f.debug_tuple("Shell").field(command).finish(),
            JobAction::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// A named cron schedule bound to an action.
#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    expression: CronExpression,
    action: JobAction,
}

impl Job {
    /// Creates a job from its parts.
    pub fn new(name: impl Into<String>, expression: CronExpression, action: JobAction) -> Self {
        Self {
            name: name.into(),
            expression,
            action,
        }
    }

    /// Creates a shell-command job.
    pub fn shell(name: impl Into<String>, expression: CronExpression, command: impl Into<String>) -> Self {
        Self::new(name, expression, JobAction::Shell(command.into()))
    }

    /// Creates a callable job.
    pub fn callable(
        name: impl Into<String>,
        expression: CronExpression,
        callable: impl Fn() -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, expression, JobAction::Callable(Arc::new(callable)))
    }

    /// Job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The job's schedule.
    pub fn expression(&self) -> &CronExpression {
        &self.expression
    }

    /// The job's action.
    pub fn action(&self) -> &JobAction {
        &self.action
    }
}

/// A log line attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Name of the job the entry belongs to.
    pub job: String,
    /// Free-form message.
    pub message: String,
    /// Severity of the entry.
    pub level: LogLevel,
}

/// Store contract the job manager drives: named job lookup and mutation
/// plus structured log writes. The engine itself never touches it.
pub trait JobStore {
    /// `true` when a job with the name exists.
    fn has(&self, name: &str) -> bool;
    /// Job by name.
    fn get(&self, name: &str) -> Option<Job>;
    /// Adds a new job; adding an existing name fails.
    fn add(&mut self, job: Job) -> Result<()>;
    /// Replaces an existing job; updating an unknown name fails.
    fn update(&mut self, job: Job) -> Result<()>;
    /// Removes a job; deleting an unknown name fails.
    fn delete(&mut self, name: &str) -> Result<()>;
    /// All stored jobs.
    fn all(&self) -> Vec<Job>;
    /// Appends a log entry for the job. Best effort, never fails.
    fn log(&mut self, job: &Job, message: &str, level: LogLevel);
}

/// Volatile in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: BTreeMap<String, Job>,
    log: Vec<LogEntry>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded log entries, oldest first.
    pub fn log_entries(&self) -> &[LogEntry] {
        &self.log
    }
}

impl JobStore for MemoryStore {
    fn has(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Job> {
        self.jobs.get(name).cloned()
    }

    fn add(&mut self, job: Job) -> Result<()> {
        if self.has(job.name()) {
            return Err(Error::Store(format!("job {:?} already exists", job.name())));
        }
        self.jobs.insert(job.name().to_string(), job);
        Ok(())
    }

    fn update(&mut self, job: Job) -> Result<()> {
        if !self.has(job.name()) {
            return Err(Error::Store(format!("job {:?} does not exist", job.name())));
        }
        self.jobs.insert(job.name().to_string(), job);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        match self.jobs.remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::Store(format!("job {name:?} does not exist"))),
        }
    }

    fn all(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    fn log(&mut self, job: &Job, message: &str, level: LogLevel) {
        self.log.push(LogEntry {
            job: job.name().to_string(),
            message: message.to_string(),
            level,
        });
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    jobs: BTreeMap<String, StoredJob>,
    log: Vec<LogEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredJob {
    expression: CronExpression,
    command: String,
}

/// JSON-file-backed store for shell-command jobs. Callables are not
/// serializable and are rejected by [`add`](JobStore::add) and
/// [`update`](JobStore::update).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file; the file is created on
    /// the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Document> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|error| Error::Store(error.to_string()))
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(error) => Err(Error::Store(error.to_string())),
        }
    }

    fn save(&self, document: &Document) -> Result<()> {
        let content =
            serde_json::to_string_pretty(document).map_err(|error| Error::Store(error.to_string()))?;
        fs::write(&self.path, content).map_err(|error| Error::Store(error.to_string()))
    }

    fn stored_job(job: &Job) -> Result<StoredJob> {
        match job.action() {
            JobAction::Shell(command) => Ok(StoredJob {
                expression: job.expression().clone(),
                command: command.clone(),
            }),
            JobAction::Callable(_) => Err(Error::Store(format!(
                "job {:?} is a callable and cannot be persisted",
                job.name()
            ))),
        }
    }
}

impl JobStore for JsonFileStore {
    fn has(&self, name: &str) -> bool {
        self.load()
            .map(|document| document.jobs.contains_key(name))
            .unwrap_or(false)
    }

    fn get(&self, name: &str) -> Option<Job> {
        let document = self.load().ok()?;
        let stored = document.jobs.get(name)?;
        Some(Job::shell(name, stored.expression.clone(), stored.command.clone()))
    }

    fn add(&mut self, job: Job) -> Result<()> {
        let stored = Self::stored_job(&job)?;
        let mut document = self.load()?;
        if document.jobs.contains_key(job.name()) {
            return Err(Error::Store(format!("job {:?} already exists", job.name())));
        }
        document.jobs.insert(job.name().to_string(), stored);
        self.save(&document)
    }

    fn update(&mut self, job: Job) -> Result<()> {
        let stored = Self::stored_job(&job)?;
        let mut document = self.load()?;
        if !document.jobs.contains_key(job.name()) {
            return Err(Error::Store(format!("job {:?} does not exist", job.name())));
        }
        document.jobs.insert(job.name().to_string(), stored);
        self.save(&document)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        let mut document = self.load()?;
        if document.jobs.remove(name).is_none() {
            return Err(Error::Store(format!("job {name:?} does not exist")));
        }
        self.save(&document)
    }

    fn all(&self) -> Vec<Job> {
        let Ok(document) = self.load() else {
            return Vec::new();
        };
        document
            .jobs
            .iter()
            .map(|(name, stored)| Job::shell(name, stored.expression.clone(), stored.command.clone()))
            .collect()
    }

    fn log(&mut self, job: &Job, message: &str, level: LogLevel) {
        if let Ok(mut document) = self.load() {
            document.log.push(LogEntry {
                job: job.name().to_string(),
                message: message.to_string(),
                level,
            });
            let _ = self.save(&document);
        }
    }
}
