//! Billing frequency and due-date arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// How often a subscription renews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingFrequency {
    /// Every month.
    #[default]
    Monthly,
    /// Every three months.
    Quarterly,
    /// Every six months.
    Semiannual,
    /// Every twelve months.
    Annual,
}

/// Error returned by the strict [`FromStr`] parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown billing frequency: {0}")]
pub struct UnknownFrequency(pub String);

impl BillingFrequency {
    /// Length of one billing period in months.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Semiannual => 6,
            Self::Annual => 12,
        }
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Annual => "annual",
        }
    }

    /// Parses a stored frequency, treating anything unrecognized as monthly.
    #[must_use]
    pub fn parse_or_monthly(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Due date one period after `date`.
    ///
    /// Days past the end of the target month clamp to its last day, so
    /// Jan 31 advances to Feb 28 (or 29). Returns `None` past chrono's range.
    #[must_use]
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        date.checked_add_months(Months::new(self.months()))
    }
}

impl FromStr for BillingFrequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semiannual" | "semi-annual" | "semi_annual" | "biannual" => Ok(Self::Semiannual),
            "annual" | "annually" | "yearly" => Ok(Self::Annual),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("monthly", BillingFrequency::Monthly)]
    #[case("Quarterly", BillingFrequency::Quarterly)]
    #[case("semi-annual", BillingFrequency::Semiannual)]
    #[case("yearly", BillingFrequency::Annual)]
    #[case("weekly", BillingFrequency::Monthly)]
    #[case("", BillingFrequency::Monthly)]
    fn test_parse_or_monthly(#[case] raw: &str, #[case] expected: BillingFrequency) {
        assert_eq!(BillingFrequency::parse_or_monthly(raw), expected);
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert_eq!(
            "fortnightly".parse::<BillingFrequency>(),
            Err(UnknownFrequency("fortnightly".to_string()))
        );
    }

    #[rstest]
    #[case(BillingFrequency::Monthly, date(2026, 1, 15), date(2026, 2, 15))]
    #[case(BillingFrequency::Monthly, date(2026, 1, 31), date(2026, 2, 28))]
    #[case(BillingFrequency::Monthly, date(2028, 1, 31), date(2028, 2, 29))]
    #[case(BillingFrequency::Quarterly, date(2026, 11, 30), date(2027, 2, 28))]
    #[case(BillingFrequency::Semiannual, date(2026, 8, 31), date(2027, 2, 28))]
    #[case(BillingFrequency::Annual, date(2028, 2, 29), date(2029, 2, 28))]
    fn test_advance(
        #[case] frequency: BillingFrequency,
        #[case] from: NaiveDate,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(frequency.advance(from), Some(expected));
    }

    #[test]
    fn test_round_trip_storage_string() {
        for frequency in [
            BillingFrequency::Monthly,
            BillingFrequency::Quarterly,
            BillingFrequency::Semiannual,
            BillingFrequency::Annual,
        ] {
            assert_eq!(BillingFrequency::parse_or_monthly(frequency.as_str()), frequency);
        }
    }
}
