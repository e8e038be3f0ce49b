use crate::{field::FieldKind, time, Error, Result};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Default bound on the run-date search.
pub const DEFAULT_MAX_ITERATION_COUNT: usize = 1000;

const ALIASES: [(&str, &str); 6] = [
    ("@yearly", "0 0 1 1 *"),
    ("@annually", "0 0 1 1 *"),
    ("@monthly", "0 0 1 * *"),
    ("@weekly", "0 0 * * 0"),
    ("@daily", "0 0 * * *"),
    ("@hourly", "0 * * * *"),
];

/// A validated five-field cron expression.
///
/// Positions are 0=minute, 1=hour, 2=day-of-month, 3=month,
/// 4=day-of-week; position 5 is reserved for a future year field and a
/// sixth part fails construction. The expression is read-only after
/// construction except for whole-part replacement via
/// [`set_part`](CronExpression::set_part), and is safe to share across
/// threads for concurrent queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpression {
    parts: [String; 5],
    max_iteration_count: usize,
}

impl CronExpression {
    /// Parses and validates an expression or one of the `@` aliases.
    pub fn new(expression: impl AsRef<str>) -> Result<Self> {
        let expression = expression.as_ref().trim();
        let expression = ALIASES
            .iter()
            .find(|(alias, _)| *alias == expression)
            .map_or(expression, |(_, expansion)| *expansion);

        let tokens: Vec<&str> = expression.split_whitespace().collect();
        if tokens.len() != 5 {
            return Err(Error::Parse(format!(
                "expected 5 fields, found {} in {expression:?}",
                tokens.len()
            )));
        }

        for (position, token) in tokens.iter().enumerate() {
            if let Some(kind) = FieldKind::from_position(position) {
                kind.validate(token)?;
            }
        }

        Ok(Self {
            parts: [
                tokens[0].to_string(),
                tokens[1].to_string(),
                tokens[2].to_string(),
                tokens[3].to_string(),
                tokens[4].to_string(),
            ],
            max_iteration_count: DEFAULT_MAX_ITERATION_COUNT,
        })
    }

    /// Returns `true` if the expression parses and validates.
    pub fn is_valid(expression: &str) -> bool {
        Self::new(expression).is_ok()
    }

    /// Token at the given position.
    pub fn part(&self, position: usize) -> Option<&str> {
        self.parts.get(position).map(String::as_str)
    }

    /// Replaces a single field token, validating it first.
    pub fn set_part(&mut self, position: usize, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        let kind = FieldKind::from_position(position).ok_or(Error::InvalidField(position))?;
        kind.validate(&token)?;
        self.parts[position] = token;
        Ok(())
    }

    /// Replaces the search iteration bound (default 1000). Sparse
    /// schedules, e.g. a yearly date queried many occurrences ahead, may
    /// need a larger bound to converge.
    pub fn set_max_iteration_count(&mut self, count: usize) {
        self.max_iteration_count = count;
    }

    /// Returns `true` iff the expression fires at the given instant,
    /// compared at minute precision in the instant's zone.
    pub fn is_due<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        match self.next_run_date(instant, 0, true) {
            Ok(next) => next.timestamp() == time::zero_seconds(instant).timestamp(),
            Err(_) => false,
        }
    }

    /// The `nth` next firing instant at or after `from`.
    ///
    /// With `allow_current` the starting instant itself counts as a
    /// match; otherwise at least one minute step is taken.
    pub fn next_run_date<Z: TimeZone>(
        &self,
        from: &DateTime<Z>,
        nth: usize,
        allow_current: bool,
    ) -> Result<DateTime<Z>> {
        self.run_date(from, nth, false, allow_current)
    }

    /// The `nth` previous firing instant at or before `from`.
    pub fn previous_run_date<Z: TimeZone>(
        &self,
        from: &DateTime<Z>,
        nth: usize,
        allow_current: bool,
    ) -> Result<DateTime<Z>> {
        self.run_date(from, nth, true, allow_current)
    }

    /// Up to `count` firing instants from `from`, backward when
    /// `invert`. Stops early and returns the partial list when the
    /// search stops converging.
    pub fn multiple_run_dates<Z: TimeZone>(
        &self,
        count: usize,
        from: &DateTime<Z>,
        invert: bool,
        allow_current: bool,
    ) -> Vec<DateTime<Z>> {
        let mut dates = Vec::with_capacity(count);

        for nth in 0..count {
            match self.run_date(from, nth, invert, allow_current) {
                Ok(date) => dates.push(date),
                Err(_) => break,
            }
        }

        dates
    }

    /// Endless iterator over future firing instants, strictly after
    /// `from`.
    pub fn iter<Z: TimeZone>(&self, from: &DateTime<Z>) -> impl Iterator<Item = DateTime<Z>> {
        RunDateIterator {
            expression: self.clone(),
            next: self.next_run_date(from, 0, false).ok(),
        }
    }

    /// The position-major convergence search. The cursor starts at the
    /// second-stripped `from` and every dissatisfied field steps it and
    /// restarts the scan, because moving a coarse component can
    /// re-invalidate a finer one.
    fn run_date<Z: TimeZone>(
        &self,
        from: &DateTime<Z>,
        nth: usize,
        invert: bool,
        allow_current: bool,
    ) -> Result<DateTime<Z>> {
        let start = time::zero_seconds(from);
        let mut cursor = start.clone();
        let mut remaining = nth as i64;

        let minute_token = self.active_token(FieldKind::Minute);

        'search: for _ in 0..self.max_iteration_count {
            for kind in FieldKind::IN_SEARCH_ORDER {
                let Some(token) = self.active_token(kind) else {
                    continue;
                };
                if !kind.is_satisfied_by(&cursor, token) {
                    let step_token = (kind == FieldKind::Minute).then_some(token);
                    kind.increment(&mut cursor, invert, step_token);
                    continue 'search;
                }
            }

            // All active fields are satisfied. The start instant only
            // counts when allowed, and `nth` matches are skipped first.
            let skip = if !allow_current && cursor == start {
                true
            } else {
                remaining -= 1;
                remaining >= 0
            };
            if skip {
                FieldKind::Minute.increment(&mut cursor, invert, minute_token);
                continue 'search;
            }

            return Ok(cursor);
        }

        Err(Error::Infeasible(self.max_iteration_count))
    }

    /// Token for the field unless it is an always-satisfied wildcard.
    fn active_token(&self, kind: FieldKind) -> Option<&str> {
        let token = self.parts[kind.position()].as_str();
        (token != "*").then_some(token)
    }
}

struct RunDateIterator<Z: TimeZone> {
    expression: CronExpression,
    next: Option<DateTime<Z>>,
}

impl<Z: TimeZone> Iterator for RunDateIterator<Z> {
    type Item = DateTime<Z>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = self.expression.next_run_date(&current, 0, false).ok();
        Some(current)
    }
}

impl Display for CronExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts.join(" "))
    }
}

impl FromStr for CronExpression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CronExpression {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CronExpression {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CronExpression> for String {
    fn from(expression: CronExpression) -> Self {
        expression.to_string()
    }
}
