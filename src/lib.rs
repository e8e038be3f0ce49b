//! Cron expression engine: due checks, next and previous run dates, and
//! validation of five-field cron expressions, timezone aware.
//!
//! | Field        | Allowed values  | Allowed special characters |
//! | ------------ | --------------- | -------------------------- |
//! | Minute       | 0-59            | * , - / ?                  |
//! | Hour         | 0-23            | * , - / ?                  |
//! | Day of Month | 1-31            | * , - / ? L W              |
//! | Month        | 1-12 or JAN-DEC | * , - / ?                  |
//! | Day of Week  | 0-7 or SUN-SAT  | * , - / ? L #              |
//!
//! The `@yearly`, `@annually`, `@monthly`, `@weekly`, `@daily` and
//! `@hourly` aliases are accepted. 0 and 7 on the day-of-week field both
//! denote Sunday.
//!
//! # Examples
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use crondue::CronExpression;
//!
//! # fn main() -> crondue::Result<()> {
//! let expression = CronExpression::new("*/15 9-17 * * MON-FRI")?;
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
//!
//! assert!(!expression.is_due(&start));
//!
//! let next = expression.next_run_date(&start, 0, false)?;
//! assert_eq!(next.to_rfc3339(), "2024-01-01T09:00:00+00:00");
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code, warnings, missing_docs)]

/// Crate specific Errors implementation.
pub mod error;
mod expression;
mod field;
/// Job registry façade composing the engine with a store.
pub mod manager;
/// Persistent store contract for named jobs.
pub mod store;
/// Instant parsing and timezone normalization.
pub mod time;
mod utils;

/// Re-export of public entities.
pub use error::Error;
pub use expression::CronExpression;
pub use field::FieldKind;
pub use manager::JobManager;
pub use store::{Job, JobAction, JobStore, JsonFileStore, LogLevel, MemoryStore};

/// Convenient alias for `Result`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
