//! Weekly recurrence: weekday names and the session dates of a month.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Weekday names ───────────────────────────────────────────────────────────

/// Resolve a catalog weekday name. Accepts the Portuguese full and short forms
/// in any case, with or without accents.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
  let lower = name.trim().to_lowercase();
  let day = match lower.as_str() {
    "domingo" => Weekday::Sun,
    "segunda-feira" | "segunda" => Weekday::Mon,
    "terça-feira" | "terca-feira" | "terça" | "terca" => Weekday::Tue,
    "quarta-feira" | "quarta" => Weekday::Wed,
    "quinta-feira" | "quinta" => Weekday::Thu,
    "sexta-feira" | "sexta" => Weekday::Fri,
    "sábado" | "sabado" => Weekday::Sat,
    _ => return Err(Error::UnknownWeekday(name.to_owned())),
  };
  Ok(day)
}

// ─── YearMonth ───────────────────────────────────────────────────────────────

/// A calendar month. Parsed from `YYYYMM` or `YYYY-MM`; displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
  first: NaiveDate,
}

impl YearMonth {
  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=9999).contains(&year) {
      return Err(Error::InvalidYearMonth(format!("{year:04}{month:02}")));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
      .map(|first| Self { first })
      .ok_or_else(|| Error::InvalidYearMonth(format!("{year:04}{month:02}")))
  }

  pub fn year(self) -> i32 { self.first.year() }

  pub fn month(self) -> u32 { self.first.month() }

  pub fn first_day(self) -> NaiveDate { self.first }

  pub fn last_day(self) -> NaiveDate {
    self
      .first
      .checked_add_months(Months::new(1))
      .and_then(|next| next.pred_opt())
      .unwrap_or(NaiveDate::MAX)
  }

  pub fn contains(self, date: NaiveDate) -> bool {
    date.year() == self.year() && date.month() == self.month()
  }
}

impl FromStr for YearMonth {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidYearMonth(s.to_owned());
    if !s.is_ascii() {
      return Err(invalid());
    }
    let (y, m) = match s.len() {
      6 => (&s[..4], &s[4..]),
      7 if s.as_bytes()[4] == b'-' => (&s[..4], &s[5..]),
      _ => return Err(invalid()),
    };
    if !y.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    let year = y.parse().map_err(|_| invalid())?;
    let month = m.parse().map_err(|_| invalid())?;
    Self::new(year, month).map_err(|_| invalid())
  }
}

impl fmt::Display for YearMonth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year(), self.month())
  }
}

impl From<YearMonth> for String {
  fn from(ym: YearMonth) -> Self { ym.to_string() }
}

impl TryFrom<String> for YearMonth {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

// ─── Session dates ───────────────────────────────────────────────────────────

/// Every `weekday` in `month`, ascending.
///
/// Starts at the first match on or after the 1st and steps a week at a time
/// until the month ends.
pub fn session_dates(
  month: YearMonth,
  weekday: Weekday,
) -> impl Iterator<Item = NaiveDate> {
  let first = month.first_day();
  let offset = (7 + weekday.num_days_from_monday()
    - first.weekday().num_days_from_monday())
    % 7;
  let start = first.checked_add_days(Days::new(offset.into()));
  std::iter::successors(start, |d| d.checked_add_days(Days::new(7)))
    .take_while(move |d| month.contains(*d))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn mondays_of_november_2025() {
    let month: YearMonth = "202511".parse().unwrap();
    let dates: Vec<_> = session_dates(month, Weekday::Mon).collect();
    assert_eq!(dates, vec![
      d(2025, 11, 3),
      d(2025, 11, 10),
      d(2025, 11, 17),
      d(2025, 11, 24)
    ]);
  }

  #[test]
  fn month_starting_on_the_weekday_includes_the_first() {
    // 2025-11-01 is a Saturday.
    let month = YearMonth::new(2025, 11).unwrap();
    let dates: Vec<_> = session_dates(month, Weekday::Sat).collect();
    assert_eq!(dates.first(), Some(&d(2025, 11, 1)));
    assert_eq!(dates.last(), Some(&d(2025, 11, 29)));
    assert_eq!(dates.len(), 5);
  }

  #[test]
  fn leap_february_has_five_thursdays_in_2024() {
    let month = YearMonth::new(2024, 2).unwrap();
    assert_eq!(session_dates(month, Weekday::Thu).count(), 5);
    assert_eq!(month.last_day(), d(2024, 2, 29));
  }

  #[test]
  fn both_year_month_formats_parse() {
    let a: YearMonth = "202511".parse().unwrap();
    let b: YearMonth = "2025-11".parse().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "2025-11");
  }

  #[test]
  fn malformed_year_month_is_rejected() {
    for s in ["202513", "2025-00", "2025/11", "20251", "abcdef", "2025-1x"] {
      assert!(
        matches!(s.parse::<YearMonth>(), Err(Error::InvalidYearMonth(_))),
        "{s} should be rejected"
      );
    }
  }

  #[test]
  fn weekday_names_are_case_insensitive() {
    assert_eq!(parse_weekday("Segunda-feira").unwrap(), Weekday::Mon);
    assert_eq!(parse_weekday("SEGUNDA").unwrap(), Weekday::Mon);
    assert_eq!(parse_weekday("Terça").unwrap(), Weekday::Tue);
    assert_eq!(parse_weekday("sábado").unwrap(), Weekday::Sat);
    assert_eq!(parse_weekday("Domingo").unwrap(), Weekday::Sun);
    assert!(matches!(
      parse_weekday("Monday"),
      Err(Error::UnknownWeekday(_))
    ));
  }
}
