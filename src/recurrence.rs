//! Computes the dates on which a recurring transaction occurs.
//!
//! A recurring transaction is anchored on the date of the original
//! transaction. [RecurrenceRule::occurrences_as_of] lists the later dates that
//! should exist as transactions by a given day. The anchor itself is never
//! listed since the original transaction already covers it.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

/// The maximum number of dates generated for a single recurring transaction.
///
/// Applies regardless of the end date or occurrence limit of the rule.
pub const MAX_OCCURRENCES: u32 = 1000;

/// How often a recurring transaction happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// The same day of every calendar month.
    Monthly,
    /// The same day and month of every year.
    Yearly,
}

impl RecurrencePattern {
    /// The name used for the pattern in the database and the JSON API.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
        }
    }

    /// The `n`th date after `anchor`, or `None` if it cannot be represented.
    ///
    /// Monthly and yearly steps keep the day of month of `anchor`, clamped to
    /// the length of the target month.
    fn nth_after(self, anchor: Date, n: u32) -> Option<Date> {
        let n = i64::from(n);

        match self {
            RecurrencePattern::Daily => anchor.checked_add(Duration::days(n)),
            RecurrencePattern::Weekly => anchor.checked_add(Duration::weeks(n)),
            RecurrencePattern::Monthly => add_months(anchor, n),
            RecurrencePattern::Yearly => add_months(anchor, n * 12),
        }
    }

    /// Whether `candidate` is due as of `as_of`.
    ///
    /// Daily and weekly occurrences are due once their date arrives. Monthly
    /// occurrences are due from the start of their month, yearly occurrences
    /// from the start of their year.
    fn is_due(self, candidate: Date, as_of: Date) -> bool {
        if candidate <= as_of {
            return true;
        }

        match self {
            RecurrencePattern::Daily | RecurrencePattern::Weekly => false,
            RecurrencePattern::Monthly => {
                candidate.year() == as_of.year() && candidate.month() == as_of.month()
            }
            RecurrencePattern::Yearly => candidate.year() == as_of.year(),
        }
    }
}

impl Display for RecurrencePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The error returned when parsing a string that is not a known [RecurrencePattern].
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("\"{0}\" is not a valid recurrence pattern")]
pub struct RecurrencePatternError(pub String);

impl FromStr for RecurrencePattern {
    type Err = RecurrencePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            other => Err(RecurrencePatternError(other.to_owned())),
        }
    }
}

/// The schedule of a recurring transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct RecurrenceRule {
    /// The date of the original transaction.
    pub anchor: Date,
    /// How often the transaction repeats.
    ///
    /// `None` when the stored pattern was not recognised, in which case no
    /// dates are generated.
    pub pattern: Option<RecurrencePattern>,
    /// No occurrence may fall after this date.
    pub end_date: Option<Date>,
    /// The maximum number of occurrences after the anchor.
    ///
    /// A limit of zero is treated the same as no limit.
    pub occurrence_limit: Option<u32>,
}

impl RecurrenceRule {
    /// List the dates after the anchor that should exist as of `as_of`, in
    /// ascending order.
    ///
    /// Generation stops at the first date after the end date, at the first
    /// date that is not yet due (see [RecurrencePattern]), after the
    /// occurrence limit is reached, or after [MAX_OCCURRENCES] dates,
    /// whichever comes first.
    pub fn occurrences_as_of(&self, as_of: Date) -> Vec<Date> {
        let Some(pattern) = self.pattern else {
            tracing::debug!("No recurrence pattern for anchor {}, skipping", self.anchor);
            return Vec::new();
        };

        let limit = self
            .occurrence_limit
            .filter(|&limit| limit > 0)
            .map_or(MAX_OCCURRENCES, |limit| limit.min(MAX_OCCURRENCES));

        let mut dates = Vec::new();

        for step in 1..=limit {
            let Some(candidate) = pattern.nth_after(self.anchor, step) else {
                tracing::debug!("Date overflow after {} {pattern} steps", step - 1);
                break;
            };

            if self.end_date.is_some_and(|end_date| candidate > end_date) {
                tracing::debug!("Reached end date at {candidate}");
                break;
            }

            if !pattern.is_due(candidate, as_of) {
                tracing::debug!("Reached future date {candidate}");
                break;
            }

            dates.push(candidate);
        }

        dates
    }
}

/// Add `months` calendar months to `date`, clamping the day to the end of the
/// target month.
///
/// Days past the end of the month are clamped rather than rolled over into the
/// next month, so Jan 31 plus one month is Feb 28 and not Mar 3.
fn add_months(date: Date, months: i64) -> Option<Date> {
    let month_index =
        i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1 + months;
    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = u8::try_from(month_index.rem_euclid(12) + 1).ok()?;
    let month = Month::try_from(month).ok()?;

    let mut day = date.day();

    loop {
        match Date::from_calendar_date(year, month, day) {
            Ok(date) => return Some(date),
            Err(_) if day > 28 => day -= 1,
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod recurrence_pattern_tests {
    use crate::recurrence::{RecurrencePattern, RecurrencePatternError};

    #[test]
    fn parses_known_patterns() {
        for pattern in [
            RecurrencePattern::Daily,
            RecurrencePattern::Weekly,
            RecurrencePattern::Monthly,
            RecurrencePattern::Yearly,
        ] {
            assert_eq!(pattern.as_str().parse(), Ok(pattern));
        }
    }

    #[test]
    fn rejects_unknown_pattern() {
        assert_eq!(
            "fortnightly".parse::<RecurrencePattern>(),
            Err(RecurrencePatternError("fortnightly".to_owned()))
        );
    }

    #[test]
    fn serializes_as_lowercase() {
        let json = serde_json::to_string(&RecurrencePattern::Monthly).unwrap();

        assert_eq!(json, "\"monthly\"");
    }
}
