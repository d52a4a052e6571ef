use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Reporting period a best-seller widget aggregates over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    CurrentYear,
    LastYear,
    CurrentMonth,
    LastMonth,
    Yesterday,
    Default,
}

impl Period {
    /// Unrecognized names select the open-ended default window.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "current_year" => Self::CurrentYear,
            "last_year" => Self::LastYear,
            "current_month" => Self::CurrentMonth,
            "last_month" => Self::LastMonth,
            "yesterday" => Self::Yesterday,
            _ => Self::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentYear => "current_year",
            Self::LastYear => "last_year",
            Self::CurrentMonth => "current_month",
            Self::LastMonth => "last_month",
            Self::Yesterday => "yesterday",
            Self::Default => "default",
        }
    }
}

/// Half-open time range `[from, to)` restricting order aggregates.
/// A missing `from` means unbounded in the past.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWindow {
    from: Option<NaiveDateTime>,
    to: NaiveDateTime,
}

impl AggregationWindow {
    /// Returns `None` when `from` is not strictly before `to`.
    pub fn new(from: Option<NaiveDateTime>, to: NaiveDateTime) -> Option<Self> {
        match from {
            Some(start) if start >= to => None,
            _ => Some(Self { from, to }),
        }
    }

    /// Calendar window for `period` relative to the store-local `now`.
    /// `None` only when a boundary falls outside the representable calendar.
    pub fn for_period(period: Period, now: NaiveDateTime) -> Option<Self> {
        let today = now.date();
        let year = today.year();
        let month = today.month();

        let (from, to) = match period {
            Period::CurrentYear => (Some(year_start(year)?), year_start(year + 1)?),
            Period::LastYear => (Some(year_start(year - 1)?), year_start(year)?),
            Period::CurrentMonth => {
                let (next_year, next_month) = shift_month(year, month, 1);
                (Some(month_start(year, month)?), month_start(next_year, next_month)?)
            }
            Period::LastMonth => {
                let (prev_year, prev_month) = shift_month(year, month, -1);
                (Some(month_start(prev_year, prev_month)?), month_start(year, month)?)
            }
            Period::Yesterday => {
                let yesterday = today.checked_sub_signed(Duration::days(1))?;
                (Some(start_of_day(yesterday)), start_of_day(today))
            }
            Period::Default => (None, year_start(year + 1)?),
        };

        Self::new(from, to)
    }

    pub fn from(&self) -> Option<NaiveDateTime> {
        self.from
    }

    pub fn to(&self) -> NaiveDateTime {
        self.to
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn year_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(start_of_day)
}

fn month_start(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1).map(start_of_day)
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + delta;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{AggregationWindow, Period};

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 30, 0))
            .expect("valid timestamp")
    }

    fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn current_month_spans_first_of_month_to_first_of_next() {
        let window = AggregationWindow::for_period(Period::CurrentMonth, at(2026, 10, 18, 14))
            .expect("window");

        assert_eq!(window.from(), Some(midnight(2026, 10, 1)));
        assert_eq!(window.to(), midnight(2026, 11, 1));
    }

    #[test]
    fn month_windows_roll_over_year_boundaries() {
        let december = AggregationWindow::for_period(Period::CurrentMonth, at(2026, 12, 31, 23))
            .expect("window");
        assert_eq!(december.to(), midnight(2027, 1, 1));

        let last_month = AggregationWindow::for_period(Period::LastMonth, at(2026, 1, 31, 8))
            .expect("window");
        assert_eq!(last_month.from(), Some(midnight(2025, 12, 1)));
        assert_eq!(last_month.to(), midnight(2026, 1, 1));
    }

    #[test]
    fn year_windows_use_calendar_boundaries() {
        let now = at(2026, 6, 15, 12);
        let current = AggregationWindow::for_period(Period::CurrentYear, now).expect("window");
        let last = AggregationWindow::for_period(Period::LastYear, now).expect("window");

        assert_eq!(current.from(), Some(midnight(2026, 1, 1)));
        assert_eq!(current.to(), midnight(2027, 1, 1));
        assert_eq!(last.from(), Some(midnight(2025, 1, 1)));
        assert_eq!(last.to(), midnight(2026, 1, 1));
    }

    #[test]
    fn yesterday_is_the_previous_full_day() {
        let window =
            AggregationWindow::for_period(Period::Yesterday, at(2026, 3, 1, 6)).expect("window");

        assert_eq!(window.from(), Some(midnight(2026, 2, 28)));
        assert_eq!(window.to(), midnight(2026, 3, 1));
    }

    #[test]
    fn default_window_is_open_ended_until_next_year() {
        let window =
            AggregationWindow::for_period(Period::Default, at(2026, 10, 18, 9)).expect("window");

        assert_eq!(window.from(), None);
        assert_eq!(window.to(), midnight(2027, 1, 1));
    }

    #[test]
    fn unknown_period_names_fall_back_to_default() {
        assert_eq!(Period::parse("forever"), Period::Default);
        assert_eq!(Period::parse(" Last_Month "), Period::LastMonth);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(AggregationWindow::new(Some(midnight(2026, 2, 1)), midnight(2026, 1, 1)).is_none());
        assert!(AggregationWindow::new(Some(midnight(2026, 1, 1)), midnight(2026, 1, 1)).is_none());
    }
}
