use chrono::{DateTime, TimeZone, Timelike, Utc};
use crondue::CronExpression;
use rstest::rstest;
use std::time::Duration;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn wildcard_minute_advances_to_the_next_minute() {
    let expression = CronExpression::new("* * * * *").unwrap();
    let next = expression
        .next_run_date(&utc(2011, 9, 27, 10, 10, 54), 0, false)
        .unwrap();
    assert_eq!(next, utc(2011, 9, 27, 10, 11, 0));
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn previous_run_rolls_back_across_a_year() {
    let expression = CronExpression::new("0 0 27 JAN *").unwrap();
    let previous = expression
        .previous_run_date(&utc(2011, 8, 22, 0, 0, 0), 0, false)
        .unwrap();
    assert_eq!(previous, utc(2011, 1, 27, 0, 0, 0));
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn weekly_alias_skips_two_matches() {
    let expression = CronExpression::new("@weekly").unwrap();
    let next = expression
        .next_run_date(&utc(2008, 11, 9, 0, 0, 0), 2, true)
        .unwrap();
    assert_eq!(next, utc(2008, 11, 23, 0, 0, 0));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
fn sparse_yearly_schedule_with_raised_cap() {
    let mut expression = CronExpression::new("0 0 12 1 *").unwrap();
    expression.set_max_iteration_count(2000);

    let dates = expression.multiple_run_dates(9, &utc(2015, 4, 28, 0, 0, 0), false, false);

    let expected: Vec<_> = (2016..=2024).map(|year| utc(year, 1, 12, 0, 0, 0)).collect();
    assert_eq!(dates, expected);
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn oversized_month_step_wraps_to_april() {
    let expression = CronExpression::new("* * * */123 *").unwrap();

    assert!(expression.is_due(&utc(2014, 4, 7, 0, 0, 0)));
    assert_eq!(
        expression
            .next_run_date(&utc(2014, 5, 7, 0, 0, 0), 0, false)
            .unwrap(),
        utc(2015, 4, 1, 0, 0, 0)
    );
}

#[rstest]
#[case("@yearly", "0 0 1 1 *")]
#[case("@annually", "0 0 1 1 *")]
#[case("@monthly", "0 0 1 * *")]
#[case("@weekly", "0 0 * * 0")]
#[case("@daily", "0 0 * * *")]
#[case("@hourly", "0 * * * *")]
fn alias_expansion(#[case] alias: &str, #[case] expanded: &str) {
    assert_eq!(CronExpression::new(alias).unwrap().to_string(), expanded);
}

#[rstest]
#[case("0  0 *\t* 0", "0 0 * * 0")]
#[case(" */5 9-17 * * MON-FRI ", "*/5 9-17 * * MON-FRI")]
fn whitespace_runs_normalize(#[case] input: &str, #[case] expected: &str) {
    assert!(CronExpression::is_valid(input));
    assert_eq!(CronExpression::new(input).unwrap().to_string(), expected);
}

#[rstest]
#[timeout(Duration::from_secs(1))]
#[case("*/5 * * * *")]
#[case("0 9 * * 1-5")]
#[case("0 0 1 * *")]
#[case("15 2-8/2 * JUN *")]
#[case("@weekly")]
fn previous_of_second_next_is_first_next(#[case] pattern: &str) {
    let expression = CronExpression::new(pattern).unwrap();
    let start = utc(2024, 3, 15, 10, 30, 0);

    let first = expression.next_run_date(&start, 0, false).unwrap();
    let second = expression.next_run_date(&start, 1, false).unwrap();
    let previous = expression.previous_run_date(&second, 0, false).unwrap();

    assert_eq!(previous, first, "pattern = {pattern}");
}

#[rstest]
#[timeout(Duration::from_secs(1))]
#[case("*/7 * * * *")]
#[case("30 6 * * *")]
#[case("0 0 L * *")]
#[case("0 12 * * 2#2")]
fn next_run_date_is_a_fixed_point_of_is_due(#[case] pattern: &str) {
    let expression = CronExpression::new(pattern).unwrap();
    let start = utc(2024, 3, 15, 10, 30, 40);

    let next = expression.next_run_date(&start, 0, true).unwrap();
    assert!(expression.is_due(&next), "pattern = {pattern}");
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn seconds_are_always_stripped() {
    let expression = CronExpression::new("* * * * *").unwrap();

    for start in [utc(2024, 1, 1, 0, 0, 1), utc(2024, 1, 1, 23, 59, 59)] {
        let next = expression.next_run_date(&start, 0, false).unwrap();
        assert_eq!(next.second(), 0, "start = {start}");
        let previous = expression.previous_run_date(&start, 0, false).unwrap();
        assert_eq!(previous.second(), 0, "start = {start}");
    }
}

#[rstest]
#[timeout(Duration::from_secs(1))]
fn caller_instants_are_never_mutated() {
    let expression = CronExpression::new("0 0 27 JAN *").unwrap();
    let start = utc(2011, 8, 22, 13, 14, 15);
    let witness = start;

    let _ = expression.next_run_date(&start, 1, false).unwrap();
    let _ = expression.previous_run_date(&start, 0, true).unwrap();
    let _ = expression.multiple_run_dates(4, &start, true, false);
    let _ = expression.is_due(&start);

    assert_eq!(start, witness);
}
