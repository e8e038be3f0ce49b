use crate::store::{Job, JobAction, JobStore, LogLevel};
use chrono::{DateTime, TimeZone};
use std::process::Command;
use tracing::{debug, warn};

/// Registry façade around the engine: loads jobs from a store, asks the
/// engine which are due, dispatches them and routes every outcome to the
/// store's log sink.
///
/// The host drives it at its own cadence; there is no daemon loop here
/// and firings missed between polls are not resurrected.
#[derive(Debug)]
pub struct JobManager<S> {
    store: S,
}

impl<S: JobStore> JobManager<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the manager, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Jobs whose expression fires at `now`.
    pub fn due_jobs<Z: TimeZone>(&self, now: &DateTime<Z>) -> Vec<Job> {
        self.store
            .all()
            .into_iter()
            .filter(|job| job.expression().is_due(now))
            .collect()
    }

    /// Runs every job due at `now` and logs each outcome. Returns the
    /// number of dispatched jobs.
    pub fn run_due<Z: TimeZone>(&mut self, now: &DateTime<Z>) -> usize {
        let due = self.due_jobs(now);

        for job in &due {
            debug!(job = job.name(), "dispatching due job");
            match dispatch(job) {
                Ok(()) => self.store.log(job, "completed", LogLevel::Success),
                Err(message) => {
                    warn!(job = job.name(), %message, "job failed");
                    self.store.log(job, &message, LogLevel::Error);
                }
            }
        }

        due.len()
    }
}

fn dispatch(job: &Job) -> Result<(), String> {
    match job.action() {
        JobAction::Shell(command) => {
            let status = Command::new("sh")
                .arg("-c")
                .arg(command)
                .status()
                .map_err(|error| error.to_string())?;
            if status.success() {
                Ok(())
            } else {
                Err(format!("command exited with {status}"))
            }
        }
        JobAction::Callable(callable) => callable(),
    }
}
