use chrono::{NaiveDate, TimeZone};
use chrono_tz::America::New_York;
use chrono_tz::Asia::{Kathmandu, Tokyo};
use chrono_tz::Europe::{Amsterdam, London};
use chrono_tz::{Tz, UTC};
use crondue::{time, CronExpression};
use rstest::rstest;
use std::time::Duration;

/// The reference instant of the cross-zone scenario:
/// 2017-10-17 10:00 in London, epoch 1508230800.
fn london_reference() -> chrono::DateTime<Tz> {
    London.with_ymd_and_hms(2017, 10, 17, 10, 0, 0).unwrap()
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn previous_run_evaluated_in_another_zone() {
    let expression = CronExpression::new("0 7 * * *").unwrap();
    let start = london_reference().with_timezone(&New_York);

    let previous = expression.previous_run_date(&start, 0, false).unwrap();

    assert_eq!(previous.timestamp(), 1508151600);
    assert_eq!(previous.to_rfc3339(), "2017-10-16T07:00:00-04:00");
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn all_input_forms_resolve_to_the_same_instant() {
    let reference = london_reference();

    // ISO string with an explicit offset
    let from_iso = time::parse_instant("2017-10-17T10:00:00+01:00").unwrap();
    assert_eq!(from_iso.timestamp(), reference.timestamp());

    // unix epoch string
    let from_unix = time::parse_instant("@1508230800").unwrap();
    assert_eq!(from_unix.timestamp(), reference.timestamp());

    // naive instant pinned to an explicit zone
    let naive = NaiveDate::from_ymd_opt(2017, 10, 17)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let from_naive = time::in_zone(naive, &London);
    assert_eq!(from_naive.timestamp(), reference.timestamp());

    // and the previous run is identical for every form
    let expression = CronExpression::new("0 7 * * *").unwrap();
    for start in [
        from_iso.with_timezone(&New_York),
        from_unix.with_timezone(&New_York),
        from_naive.with_timezone(&New_York),
    ] {
        let previous = expression.previous_run_date(&start, 0, false).unwrap();
        assert_eq!(previous.timestamp(), 1508151600);
    }
}

#[rstest]
#[timeout(Duration::from_secs(1))]
#[case(UTC)]
#[case(Amsterdam)]
#[case(Tokyo)]
fn due_only_in_the_construction_zone(#[case] zone: Tz) {
    // 2014-01-01 is a Wednesday; 15:00 on the wall clock of `zone`.
    let expression = CronExpression::new("0 15 * * 3").unwrap();
    let instant = zone.with_ymd_and_hms(2014, 1, 1, 15, 0, 0).unwrap();

    assert!(expression.is_due(&instant), "due in {zone}");

    for other in [UTC, Amsterdam, Tokyo] {
        if other != zone {
            assert!(
                !expression.is_due(&instant.with_timezone(&other)),
                "not due once converted to {other}"
            );
        }
    }
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn non_whole_hour_offset_keeps_wall_clock() {
    let expression = CronExpression::new("30 9 * * *").unwrap();
    let start = Kathmandu.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();

    let next = expression.next_run_date(&start, 0, false).unwrap();

    assert_eq!(next.to_rfc3339(), "2024-01-01T09:30:00+05:45");
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn spring_forward_gap_skips_to_the_next_day() {
    // Amsterdam jumps 02:00 -> 03:00 on 2024-03-31; 02:30 never happens.
    let expression = CronExpression::new("30 2 * * *").unwrap();
    let start = Amsterdam.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();

    let next = expression.next_run_date(&start, 0, false).unwrap();

    assert_eq!(next.to_rfc3339(), "2024-04-01T02:30:00+02:00");
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn fall_back_fold_fires_on_the_first_pass() {
    // Amsterdam repeats 02:00-03:00 on 2024-10-27; the earlier pass wins.
    let expression = CronExpression::new("30 2 * * *").unwrap();
    let start = Amsterdam.with_ymd_and_hms(2024, 10, 27, 0, 0, 0).unwrap();

    let next = expression.next_run_date(&start, 0, false).unwrap();

    assert_eq!(next.to_rfc3339(), "2024-10-27T02:30:00+02:00");
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn due_check_in_an_explicitly_resolved_zone() {
    let expression = CronExpression::new("0 7 * * *").unwrap();
    let zone = time::zone_by_name("America/New_York").unwrap();
    let instant = time::parse_instant("@1508151600").unwrap().with_timezone(&zone);

    assert!(expression.is_due(&instant));
}
