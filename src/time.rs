//! Instant parsing and timezone normalization.
//!
//! Run-date queries accept instants in several shapes: zoned datetimes,
//! naive datetimes and strings (RFC 3339, `@<unix>` or naive local).
//! Everything is coerced to a zoned instant with seconds zeroed before
//! any comparison; resolution rules are: an explicit zone argument wins,
//! else the input's own zone, else the host's default zone.

use crate::{Error, Result};
use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Timelike,
};
use chrono_tz::Tz;

/// Upper bound for walking out of a DST gap, generous enough for the
/// historical worst case (a skipped calendar day).
const MAX_GAP_WALK_MINUTES: u32 = 2 * 24 * 60;

/// Accepted naive datetime layouts for [`parse_instant`].
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses an instant string.
///
/// Accepted forms: RFC 3339 / ISO 8601 with an explicit offset
/// (`2017-10-17T10:00:00+01:00`), unix epoch seconds (`@1508151600`), a
/// naive datetime (`2008-11-09 00:00:00`) or a bare date, the latter two
/// interpreted in the host's default zone.
pub fn parse_instant(input: &str) -> Result<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Some(seconds) = input.strip_prefix('@') {
        let seconds: i64 = seconds
            .parse()
            .map_err(|_| Error::InvalidInstant(input.to_string()))?;
        return DateTime::from_timestamp(seconds, 0)
            .map(|instant| instant.fixed_offset())
            .ok_or_else(|| Error::InvalidInstant(input.to_string()));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(resolve_naive(&Local, naive, true).fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(resolve_naive(&Local, date.and_time(NaiveTime::MIN), true).fixed_offset());
    }

    Err(Error::InvalidInstant(input.to_string()))
}

/// Resolves an IANA timezone name, e.g. `America/New_York`.
pub fn zone_by_name(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_string()))
}

/// Reinterprets a naive instant on the wall clock of `zone`.
pub fn in_zone<Z: TimeZone>(naive: NaiveDateTime, zone: &Z) -> DateTime<Z> {
    resolve_naive(zone, naive, true)
}

/// Truncates an instant to minute precision in its own zone.
pub fn zero_seconds<Z: TimeZone>(instant: &DateTime<Z>) -> DateTime<Z> {
    instant
        .with_second(0)
        .and_then(|truncated| truncated.with_nanosecond(0))
        .unwrap_or_else(|| instant.clone())
}

/// Maps a wall-clock time onto `zone`, resolving DST anomalies
/// deterministically: an ambiguous time takes the earlier instant when
/// searching forward and the later one when searching backward; a
/// nonexistent time is stepped minute-wise in the search direction until
/// it exists.
pub(crate) fn resolve_naive<Z: TimeZone>(zone: &Z, naive: NaiveDateTime, forward: bool) -> DateTime<Z> {
    let step = if forward {
        TimeDelta::minutes(1)
    } else {
        TimeDelta::minutes(-1)
    };
    let mut candidate = naive;

    for _ in 0..MAX_GAP_WALK_MINUTES {
        match zone.from_local_datetime(&candidate) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earlier, later) => return if forward { earlier } else { later },
            LocalResult::None => candidate += step,
        }
    }

    // No IANA zone has gaps this wide; interpret as UTC rather than spin.
    zone.from_utc_datetime(&naive)
}

/// Shifts an instant by whole wall-clock minutes in its own zone.
pub(crate) fn walk_minutes<Z: TimeZone>(instant: &DateTime<Z>, minutes: i64) -> DateTime<Z> {
    let naive = instant.naive_local() + TimeDelta::minutes(minutes);
    resolve_naive(&instant.timezone(), naive, minutes >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use chrono_tz::America::New_York;
    use chrono_tz::Europe::Amsterdam;
    use rstest::rstest;

    #[test]
    fn parse_instant_unix() {
        let instant = parse_instant("@1508151600").unwrap();
        assert_eq!(instant.timestamp(), 1508151600);
        assert_eq!(instant.to_rfc3339(), "2017-10-16T11:00:00+00:00");
    }

    #[test]
    fn parse_instant_with_offset() {
        let instant = parse_instant("2017-10-17T10:00:00+01:00").unwrap();
        assert_eq!(instant.timestamp(), 1508230800);
    }

    #[test]
    fn parse_instant_naive_uses_host_zone() {
        let instant = parse_instant("2008-11-09 00:00:00").unwrap();
        let expected = resolve_naive(
            &Local,
            NaiveDate::from_ymd_opt(2008, 11, 9)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            true,
        );
        assert_eq!(instant.timestamp(), expected.timestamp());
    }

    #[rstest]
    #[case("")]
    #[case("@")]
    #[case("@12.5")]
    #[case("yesterday")]
    #[case("2017-13-01 00:00:00")]
    fn parse_instant_rejects_garbage(#[case] input: &str) {
        assert!(matches!(parse_instant(input), Err(Error::InvalidInstant(_))));
    }

    #[test]
    fn zone_by_name_resolution() {
        assert_eq!(zone_by_name("America/New_York").unwrap(), New_York);
        assert!(matches!(
            zone_by_name("Mars/Olympus_Mons"),
            Err(Error::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn zero_seconds_truncates_in_zone() {
        let instant = Amsterdam.with_ymd_and_hms(2014, 1, 1, 15, 0, 54).unwrap();
        let truncated = zero_seconds(&instant);
        assert_eq!(truncated.second(), 0);
        assert_eq!(truncated.minute(), 0);
        assert_eq!(truncated.hour(), 15);
    }

    #[test]
    fn resolve_naive_skips_dst_gap_forward() {
        // 2024-03-31 02:30 does not exist in Amsterdam; clocks jump 02:00 -> 03:00.
        let naive = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        let resolved = resolve_naive(&Amsterdam, naive, true);
        assert_eq!(resolved.hour(), 3);
        assert_eq!(resolved.minute(), 0);
    }

    #[test]
    fn resolve_naive_picks_fold_side() {
        // 2024-10-27 02:30 happens twice in Amsterdam.
        let naive = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        let earlier = resolve_naive(&Amsterdam, naive, true);
        let later = resolve_naive(&Amsterdam, naive, false);
        assert!(earlier.timestamp() < later.timestamp());
        assert_eq!(later.timestamp() - earlier.timestamp(), 3600);
    }

    #[test]
    fn walk_minutes_steps_wall_clock() {
        let instant = Utc.with_ymd_and_hms(2011, 9, 27, 10, 10, 0).unwrap();
        assert_eq!(walk_minutes(&instant, 1).minute(), 11);
        assert_eq!(walk_minutes(&instant, -11).minute(), 59);
        assert_eq!(walk_minutes(&instant, -11).hour(), 9);
    }
}
