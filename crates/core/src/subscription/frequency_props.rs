//! Property-based tests for due-date arithmetic.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use super::catch_up::CatchUpDriver;
use super::frequency::BillingFrequency;

fn frequency_strategy() -> impl Strategy<Value = BillingFrequency> {
    prop_oneof![
        Just(BillingFrequency::Monthly),
        Just(BillingFrequency::Quarterly),
        Just(BillingFrequency::Semiannual),
        Just(BillingFrequency::Annual),
    ]
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + i32::try_from(to.month()).unwrap() - i32::try_from(from.month()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Advancing moves exactly one period of calendar months forward.
    #[test]
    fn prop_advance_moves_whole_months(
        frequency in frequency_strategy(),
        date in date_strategy(),
    ) {
        let next = frequency.advance(date).unwrap();
        prop_assert!(next > date);
        prop_assert_eq!(
            months_between(date, next),
            i32::try_from(frequency.months()).unwrap()
        );
    }

    /// The day of month is kept unless the target month is too short.
    #[test]
    fn prop_advance_clamps_day(
        frequency in frequency_strategy(),
        date in date_strategy(),
    ) {
        let next = frequency.advance(date).unwrap();
        prop_assert!(next.day() <= date.day());
        if next.day() < date.day() {
            // Clamped: next must be the last day of its month.
            prop_assert!(next.succ_opt().unwrap().month() != next.month());
        }
    }

    /// A catch-up run never exceeds its cycle bound.
    #[test]
    fn prop_catch_up_is_bounded(
        max in 0u32..24,
        missed in 0u32..60,
    ) {
        let today = NaiveDate::from_ymd_opt(2030, 6, 15).unwrap();
        let mut due = today
            .checked_sub_months(chrono::Months::new(missed))
            .unwrap();
        let mut driver = CatchUpDriver::new(max, today, due);
        let halt = loop {
            if let Some(halt) = driver.check(true, due) {
                break halt;
            }
            due = BillingFrequency::Monthly.advance(due).unwrap();
            driver.record_renewal(due);
        };
        let report = driver.finish(halt);
        prop_assert!(report.cycles <= max);
        prop_assert_eq!(report.cycles, max.min(missed + 1));
    }
}
