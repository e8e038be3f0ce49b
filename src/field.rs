use crate::{time, utils, Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike};

/// Scalar type of field values.
pub(crate) type FieldValue = u32;

const MONTH_LITERALS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DOW_LITERALS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// The five positional cron fields as a tagged variant sharing one
/// numeric kernel.
///
/// Each field owns its value range and optional literal table and
/// provides token validation, satisfaction tests against an instant, and
/// cursor stepping for the run-date search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Minutes, 0-59.
    Minute,
    /// Hours, 0-23.
    Hour,
    /// Day of month, 1-31, with `L` and `<n>W`.
    DayOfMonth,
    /// Month, 1-12 or JAN-DEC.
    Month,
    /// Day of week, 0-7 or SUN-SAT (0 and 7 are Sunday), with `<n>L` and
    /// `<n>#<k>`.
    DayOfWeek,
}

impl FieldKind {
    /// Search evaluation order: coarsest calendar component first.
    pub(crate) const IN_SEARCH_ORDER: [FieldKind; 5] = [
        FieldKind::Month,
        FieldKind::DayOfMonth,
        FieldKind::DayOfWeek,
        FieldKind::Hour,
        FieldKind::Minute,
    ];

    /// Field bound to the given expression position, if any.
    pub fn from_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(FieldKind::Minute),
            1 => Some(FieldKind::Hour),
            2 => Some(FieldKind::DayOfMonth),
            3 => Some(FieldKind::Month),
            4 => Some(FieldKind::DayOfWeek),
            _ => None,
        }
    }

    /// Position of this field within an expression.
    pub fn position(self) -> usize {
        match self {
            FieldKind::Minute => 0,
            FieldKind::Hour => 1,
            FieldKind::DayOfMonth => 2,
            FieldKind::Month => 3,
            FieldKind::DayOfWeek => 4,
        }
    }

    fn range_start(self) -> FieldValue {
        match self {
            FieldKind::Minute | FieldKind::Hour | FieldKind::DayOfWeek => 0,
            FieldKind::DayOfMonth | FieldKind::Month => 1,
        }
    }

    fn range_end(self) -> FieldValue {
        match self {
            FieldKind::Minute => 59,
            FieldKind::Hour => 23,
            FieldKind::DayOfMonth => 31,
            FieldKind::Month => 12,
            FieldKind::DayOfWeek => 7,
        }
    }

    fn literals(self) -> Option<(&'static [&'static str], FieldValue)> {
        match self {
            FieldKind::Month => Some((&MONTH_LITERALS, 1)),
            FieldKind::DayOfWeek => Some((&DOW_LITERALS, 0)),
            _ => None,
        }
    }

    fn contains(self, value: FieldValue) -> bool {
        (self.range_start()..=self.range_end()).contains(&value)
    }

    /// Substitutes literal names with their canonical numbers, including
    /// occurrences inside ranges, steps and hashes.
    fn convert_literals(self, token: &str) -> String {
        let Some((names, base)) = self.literals() else {
            return token.to_string();
        };

        let mut converted = token.to_string();
        for (index, name) in names.iter().enumerate() {
            if converted.to_ascii_uppercase().contains(name) {
                converted = replace_ignore_ascii_case(&converted, name, &(base + index as FieldValue).to_string());
            }
        }
        converted
    }

    /// Converts a numeric chunk into a value within the field's range.
    fn parse_value(self, chunk: &str) -> Option<FieldValue> {
        if !all_digits(chunk) {
            return None;
        }
        let value: FieldValue = chunk.parse().ok()?;
        self.contains(value).then_some(value)
    }

    fn invalid_value(self, token: &str) -> Error {
        Error::InvalidValue {
            position: self.position(),
            token: token.to_string(),
        }
    }

    /// Checks a whole field token (possibly a comma list) against this
    /// field's grammar.
    pub fn validate(self, token: &str) -> Result<()> {
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(self.invalid_value(token));
        }

        let chunks: Vec<&str> = token.split(',').collect();

        // Day-of-month lists may not mix `L` or `<n>W` with other items.
        if self == FieldKind::DayOfMonth
            && chunks.len() > 1
            && chunks.iter().any(|chunk| *chunk == "L" || chunk.ends_with('W'))
        {
            return Err(self.invalid_value(token));
        }

        for chunk in chunks {
            self.validate_chunk(token, chunk)?;
        }

        Ok(())
    }

    fn validate_chunk(self, token: &str, chunk: &str) -> Result<()> {
        if chunk.is_empty() {
            return Err(self.invalid_value(token));
        }
        if chunk == "*" || chunk == "?" {
            return Ok(());
        }

        match self {
            FieldKind::DayOfMonth => {
                if chunk == "L" {
                    return Ok(());
                }
                if let Some(day) = chunk.strip_suffix('W') {
                    return match self.parse_value(day) {
                        Some(_) => Ok(()),
                        None => Err(self.invalid_value(token)),
                    };
                }
            }
            FieldKind::DayOfWeek => {
                let converted = self.convert_literals(chunk);
                if let Some((weekday, nth)) = converted.split_once('#') {
                    return self.validate_hash(weekday, nth);
                }
                if converted == "L" {
                    return Err(self.invalid_value(token));
                }
                if let Some(weekday) = converted.strip_suffix('L') {
                    return match self.parse_value(weekday) {
                        Some(_) => Ok(()),
                        None => Err(self.invalid_value(token)),
                    };
                }
                let converted = if converted.contains('-') {
                    rewrite_sunday_range(&converted)
                } else {
                    converted
                };
                return self.validate_basic(token, &converted);
            }
            _ => {}
        }

        let converted = self.convert_literals(chunk);
        self.validate_basic(token, &converted)
    }

    fn validate_hash(self, weekday: &str, nth: &str) -> Result<()> {
        if !all_digits(nth) {
            return Err(Error::InvalidHash(format!(
                "nth must be a number in 1-5, got {nth:?}"
            )));
        }
        let nth: FieldValue = nth
            .parse()
            .map_err(|_| Error::InvalidHash(format!("nth must be a number in 1-5, got {nth:?}")))?;
        if !(1..=5).contains(&nth) {
            return Err(Error::InvalidHash(format!("nth {nth} is out of range 1-5")));
        }
        // 0 and 7 both normalize to Sunday, anything beyond is rejected.
        if self.parse_value(weekday).is_none() {
            return Err(Error::InvalidHash(format!(
                "weekday {weekday:?} is out of range 0-7"
            )));
        }
        Ok(())
    }

    /// Validates `v`, `a-b` and `expr/s` after literal substitution.
    fn validate_basic(self, token: &str, chunk: &str) -> Result<()> {
        if let Some((base, step)) = chunk.split_once('/') {
            if !all_digits(step) {
                return Err(self.invalid_value(token));
            }
            let step: FieldValue = step.parse().map_err(|_| self.invalid_value(token))?;
            if step == 0 {
                return Err(self.invalid_value(token));
            }
            if base == "*" {
                return Ok(());
            }
            if let Some((first, last)) = base.split_once('-') {
                return self.validate_bounds(token, first, last);
            }
            // A bare base is the start of an implicit base-to-end range.
            return self.validate_bounds(token, base, &self.range_end().to_string());
        }

        if let Some((first, last)) = chunk.split_once('-') {
            return self.validate_bounds(token, first, last);
        }

        match self.parse_value(chunk) {
            Some(_) => Ok(()),
            None => Err(self.invalid_value(token)),
        }
    }

    fn validate_bounds(self, token: &str, first: &str, last: &str) -> Result<()> {
        if !all_digits(first) || !all_digits(last) {
            return Err(self.invalid_value(token));
        }
        let first: FieldValue = first.parse().map_err(|_| self.invalid_value(token))?;
        let last: FieldValue = last.parse().map_err(|_| self.invalid_value(token))?;
        if !self.contains(first) || !self.contains(last) {
            return Err(Error::OutOfRange(format!(
                "{token}: bounds must be within {}-{}",
                self.range_start(),
                self.range_end()
            )));
        }
        if first > last {
            return Err(Error::OutOfRange(format!(
                "{token}: decreasing range {first}-{last}"
            )));
        }
        Ok(())
    }

    /// Tests whether the instant matches the token; comma lists match if
    /// any of their items does.
    pub fn is_satisfied_by<Z: TimeZone>(self, instant: &DateTime<Z>, token: &str) -> bool {
        token.split(',').any(|chunk| self.chunk_satisfied(instant, chunk))
    }

    fn chunk_satisfied<Z: TimeZone>(self, instant: &DateTime<Z>, chunk: &str) -> bool {
        match self {
            FieldKind::Minute => self.is_satisfied(instant.minute(), chunk),
            FieldKind::Hour => self.is_satisfied(instant.hour(), chunk),
            FieldKind::Month => {
                let chunk = self.convert_literals(chunk);
                self.is_satisfied(instant.month(), &chunk)
            }
            FieldKind::DayOfMonth => self.day_of_month_satisfied(instant, chunk),
            FieldKind::DayOfWeek => self.day_of_week_satisfied(instant, chunk),
        }
    }

    fn day_of_month_satisfied<Z: TimeZone>(self, instant: &DateTime<Z>, chunk: &str) -> bool {
        let (year, month, day) = (instant.year(), instant.month(), instant.day());
        match chunk {
            "L" => day == utils::days_in_month(year, month),
            _ => {
                if let Some(target) = chunk.strip_suffix('W') {
                    match self.parse_value(target) {
                        Some(target) => utils::nearest_weekday(year, month, target) == Some(day),
                        None => false,
                    }
                } else {
                    self.is_satisfied(day, chunk)
                }
            }
        }
    }

    fn day_of_week_satisfied<Z: TimeZone>(self, instant: &DateTime<Z>, chunk: &str) -> bool {
        if chunk == "*" || chunk == "?" {
            return true;
        }
        let chunk = self.convert_literals(chunk);

        if let Some(target) = chunk.strip_suffix('L') {
            let Some(target) = self.parse_value(target) else {
                return false;
            };
            // Last occurrence of the weekday within the cursor's month.
            return instant.day()
                == utils::last_weekday_of_month(instant.year(), instant.month(), target % 7);
        }

        if let Some((weekday, nth)) = chunk.split_once('#') {
            let Some(weekday) = self.parse_value(weekday) else {
                return false;
            };
            let Ok(nth) = nth.parse::<FieldValue>() else {
                return false;
            };
            if !(1..=5).contains(&nth) {
                return false;
            }
            let weekday = if weekday == 0 { 7 } else { weekday };
            return instant.weekday().number_from_monday() == weekday
                && (instant.day() + 6) / 7 == nth;
        }

        let chunk = if chunk.contains('-') {
            rewrite_sunday_range(&chunk)
        } else {
            chunk
        };
        // 0 and 7 both denote Sunday: tokens naming 7 compare in ISO
        // numbering, everything else zero-based.
        let scalar = if chunk.contains('7') {
            instant.weekday().number_from_monday()
        } else {
            instant.weekday().num_days_from_sunday()
        };
        self.is_satisfied(scalar, &chunk)
    }

    /// Scalar-versus-token kernel shared by all numeric fields. The
    /// token is a single chunk after literal substitution.
    fn is_satisfied(self, scalar: FieldValue, token: &str) -> bool {
        if token.contains('/') {
            self.is_in_increments_of_ranges(scalar, token)
        } else if token.contains('-') {
            self.is_in_range(scalar, token)
        } else if token == "*" || token == "?" {
            true
        } else {
            token.parse::<FieldValue>().map(|value| value == scalar).unwrap_or(false)
        }
    }

    fn is_in_range(self, scalar: FieldValue, token: &str) -> bool {
        let Some((first, last)) = token.split_once('-') else {
            return false;
        };
        let Ok(first) = first.parse::<FieldValue>() else {
            return false;
        };
        let Ok(last) = last.parse::<FieldValue>() else {
            return false;
        };
        first <= scalar && scalar <= last
    }

    fn is_in_increments_of_ranges(self, scalar: FieldValue, token: &str) -> bool {
        let Some((base, step)) = token.split_once('/') else {
            return false;
        };
        let Ok(step) = step.parse::<FieldValue>() else {
            return false;
        };
        if step == 0 {
            return false;
        }
        let Some((start, end)) = self.step_bounds(base) else {
            return false;
        };

        if step >= self.range_end() - self.range_start() {
            return Some(scalar) == self.wrapped_step_value(step);
        }

        step_values(start, end, step).contains(&scalar)
    }

    /// Oversized steps wrap around and collapse to a single value of the
    /// full range, so `*/123` stays legal on a 12-value field.
    fn wrapped_step_value(self, step: FieldValue) -> Option<FieldValue> {
        let length = self.range_end() - self.range_start() + 1;
        (step >= self.range_end() - self.range_start()).then_some(self.range_start() + step % length)
    }

    fn step_bounds(self, base: &str) -> Option<(FieldValue, FieldValue)> {
        let (start, end) = if base == "*" || base == "?" {
            (self.range_start(), self.range_end())
        } else if let Some((first, last)) = base.split_once('-') {
            (first.parse::<FieldValue>().ok()?, last.parse::<FieldValue>().ok()?)
        } else {
            (base.parse::<FieldValue>().ok()?, self.range_end())
        };
        (start <= end && self.contains(start) && self.contains(end)).then_some((start, end))
    }

    /// Ordered enumeration of the values within `[0, max]` matching the
    /// token. Invalid chunks enumerate nothing.
    pub fn range_for_expression(self, token: &str, max: FieldValue) -> Vec<FieldValue> {
        let mut values = Vec::new();

        for chunk in token.split(',') {
            let chunk = self.convert_literals(chunk);
            if chunk == "*" || chunk == "?" {
                values.extend(self.range_start()..=self.range_end().min(max));
            } else if let Some((base, step)) = chunk.split_once('/') {
                let Ok(step) = step.parse::<FieldValue>() else {
                    continue;
                };
                if step == 0 {
                    continue;
                }
                let Some((start, end)) = self.step_bounds(base) else {
                    continue;
                };
                if let Some(value) = self.wrapped_step_value(step) {
                    if value <= max {
                        values.push(value);
                    }
                } else {
                    values.extend(step_values(start, end.min(max), step));
                }
            } else if chunk.contains('-') {
                let Some((first, last)) = chunk.split_once('-') else {
                    continue;
                };
                let (Ok(first), Ok(last)) = (first.parse::<FieldValue>(), last.parse::<FieldValue>())
                else {
                    continue;
                };
                if first <= last {
                    values.extend(first..=last.min(max));
                }
            } else if let Ok(value) = chunk.parse::<FieldValue>() {
                if value <= max {
                    values.push(value);
                }
            }
        }

        values.sort_unstable();
        values.dedup();
        values
    }

    /// Advances the cursor by one unit of this field, forward or
    /// backward. Forward stepping zeroes the lower-significance
    /// components, backward stepping sets them to their maximum. The
    /// minute field optionally uses its token to jump straight to the
    /// next (previous) matching minute.
    pub(crate) fn increment<Z: TimeZone>(self, cursor: &mut DateTime<Z>, invert: bool, token: Option<&str>) {
        match self {
            FieldKind::Minute => self.increment_minute(cursor, invert, token),
            FieldKind::Hour => {
                let delta = if invert { TimeDelta::hours(-1) } else { TimeDelta::hours(1) };
                let shifted = cursor.naive_local() + delta;
                let snapped = snap_time(shifted, shifted.hour(), if invert { 59 } else { 0 });
                *cursor = time::resolve_naive(&cursor.timezone(), snapped, !invert);
            }
            FieldKind::DayOfMonth | FieldKind::DayOfWeek => {
                let date = cursor.date_naive();
                let naive = if invert {
                    date.pred_opt().unwrap_or(date).and_time(end_of_day())
                } else {
                    date.succ_opt().unwrap_or(date).and_time(NaiveTime::MIN)
                };
                *cursor = time::resolve_naive(&cursor.timezone(), naive, !invert);
            }
            FieldKind::Month => {
                let (year, month) = (cursor.year(), cursor.month());
                let naive = if invert {
                    let (year, month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
                    NaiveDate::from_ymd_opt(year, month, utils::days_in_month(year, month))
                        .map(|date| date.and_time(end_of_day()))
                } else {
                    let (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                    NaiveDate::from_ymd_opt(year, month, 1).map(|date| date.and_time(NaiveTime::MIN))
                };
                if let Some(naive) = naive {
                    *cursor = time::resolve_naive(&cursor.timezone(), naive, !invert);
                }
            }
        }
    }

    fn increment_minute<Z: TimeZone>(self, cursor: &mut DateTime<Z>, invert: bool, token: Option<&str>) {
        let minutes = token
            .map(|token| self.range_for_expression(token, 59))
            .unwrap_or_default();
        if minutes.is_empty() {
            *cursor = time::walk_minutes(cursor, if invert { -1 } else { 1 });
            return;
        }

        let current = cursor.minute();
        let target = if invert {
            minutes.iter().rev().find(|&&minute| minute < current)
        } else {
            minutes.iter().find(|&&minute| minute > current)
        };

        match target {
            Some(&minute) => {
                let naive = cursor.naive_local();
                let snapped = snap_time(naive, naive.hour(), minute);
                *cursor = time::resolve_naive(&cursor.timezone(), snapped, !invert);
            }
            // Wrapped past the set: move one hour and let the scan re-enter.
            None => FieldKind::Hour.increment(cursor, invert, None),
        }
    }
}

/// Enumeration of `start..=end` stepped by `step`.
fn step_values(start: FieldValue, end: FieldValue, step: FieldValue) -> Vec<FieldValue> {
    let mut values = Vec::new();
    let mut next = start;
    while next <= end {
        values.push(next);
        next += step;
    }
    values
}

fn all_digits(chunk: &str) -> bool {
    !chunk.is_empty() && chunk.bytes().all(|byte| byte.is_ascii_digit())
}

/// Rewrites the two spellings of Sunday so ranges stay monotone:
/// a leading `7` becomes `0`, a trailing `0` becomes `7` (`6-0` ⇒ `6-7`).
fn rewrite_sunday_range(token: &str) -> String {
    let (range, step) = match token.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (token, None),
    };
    let Some((first, last)) = range.split_once('-') else {
        return token.to_string();
    };
    let first = if first == "7" { "0" } else { first };
    let last = if last == "0" { "7" } else { last };
    match step {
        Some(step) => format!("{first}-{last}/{step}"),
        None => format!("{first}-{last}"),
    }
}

fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let upper = haystack.to_ascii_uppercase();
    let mut output = String::with_capacity(haystack.len());
    let mut rest = 0;
    while let Some(found) = upper[rest..].find(needle) {
        let at = rest + found;
        output.push_str(&haystack[rest..at]);
        output.push_str(replacement);
        rest = at + needle.len();
    }
    output.push_str(&haystack[rest..]);
    output
}

fn snap_time(naive: NaiveDateTime, hour: u32, minute: u32) -> NaiveDateTime {
    let clock = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    NaiveDateTime::new(naive.date(), clock)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}
