//! Month grid construction for the calendar page.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::model::Assignment;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// How many years the year picker offers on each side of the viewed year.
pub const YEAR_PICKER_SPAN: i32 = 5;

/// English name of a month, `None` outside 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("Date {year}-{month:02} is out of range")]
    OutOfRange { year: i32, month: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// One cell of the grid. `day == 0` marks a cell belonging to an adjacent
/// month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DayCell {
    pub day: u32,
    pub has_assignment: bool,
    pub is_current: bool,
}

impl DayCell {
    pub fn placeholder() -> Self {
        Self {
            day: 0,
            has_assignment: false,
            is_current: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.day == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    /// Monday-first weeks, each exactly seven cells long.
    pub weeks: Vec<Vec<DayCell>>,
    pub previous: YearMonth,
    pub next: YearMonth,
    pub current_day: u32,
    pub months: Vec<(u32, &'static str)>,
    pub years: Vec<i32>,
}

impl MonthGrid {
    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flatten().filter(|cell| !cell.is_placeholder())
    }
}

/// Days of the given month on which at least one assignment is scheduled.
/// Assignments from other months are ignored.
pub fn days_with_assignment(assignments: &[Assignment], year: i32, month: u32) -> BTreeSet<u32> {
    assignments
        .iter()
        .map(Assignment::day)
        .filter(|date| date.year() == year && date.month() == month)
        .map(|date| date.day())
        .collect()
}

/// Builds the annotated grid for `year`/`month`.
///
/// `today` drives the `is_current` marker and is passed in so callers
/// control the clock.
pub fn build_month_grid(
    year: i32,
    month: u32,
    assignments: &[Assignment],
    today: NaiveDate,
) -> Result<MonthGrid, CalendarError> {
    let month_name = month_name(month).ok_or(CalendarError::InvalidMonth(month))?;
    let out_of_range = || CalendarError::OutOfRange { year, month };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let previous = first
        .checked_sub_days(Days::new(1))
        .ok_or_else(out_of_range)?;
    // The 28th exists in every month and four days later is always next month.
    let next = NaiveDate::from_ymd_opt(year, month, 28)
        .and_then(|date| date.checked_add_days(Days::new(4)))
        .ok_or_else(out_of_range)?;
    let next_first = next.with_day(1).ok_or_else(out_of_range)?;
    let days_in_month = (next_first - first).num_days() as u32;

    let marked = days_with_assignment(assignments, year, month);
    let is_current_month = today.year() == year && today.month() == month;

    let leading = first.weekday().num_days_from_monday() as usize;
    let mut cells = vec![DayCell::placeholder(); leading];
    cells.extend((1..=days_in_month).map(|day| DayCell {
        day,
        has_assignment: marked.contains(&day),
        is_current: is_current_month && today.day() == day,
    }));
    while cells.len() % 7 != 0 {
        cells.push(DayCell::placeholder());
    }
    let weeks = cells.chunks(7).map(<[DayCell]>::to_vec).collect();

    Ok(MonthGrid {
        year,
        month,
        month_name,
        weeks,
        previous: previous.into(),
        next: next.into(),
        current_day: today.day(),
        months: (1..=12).zip(MONTH_NAMES).collect(),
        years: (year - YEAR_PICKER_SPAN..=year + YEAR_PICKER_SPAN).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    #[test]
    fn can_keep_grid_rectangular_for_every_month() {
        for year in [2023, 2024, 2025, 2026] {
            for month in 1..=12 {
                let grid = build_month_grid(year, month, &[], today()).unwrap();
                let days_in_month = (28..=31)
                    .rev()
                    .find(|day| NaiveDate::from_ymd_opt(year, month, *day).is_some())
                    .unwrap();

                assert!(grid.weeks.iter().all(|week| week.len() == 7));
                let days: Vec<u32> = grid.days().map(|cell| cell.day).collect();
                let expected: Vec<u32> = (1..=days_in_month).collect();
                assert_eq!(days, expected, "{year}-{month}");
            }
        }
    }

    #[test]
    fn can_start_weeks_on_monday() {
        // 1 May 2024 is a Wednesday.
        let grid = build_month_grid(2024, 5, &[], today()).unwrap();

        let first_week: Vec<u32> = grid.weeks[0].iter().map(|cell| cell.day).collect();
        assert_eq!(first_week, vec![0, 0, 1, 2, 3, 4, 5]);
        assert_eq!(grid.weeks.len(), 5);
        let last_week: Vec<u32> = grid.weeks[4].iter().map(|cell| cell.day).collect();
        assert_eq!(last_week, vec![27, 28, 29, 30, 31, 0, 0]);
    }

    #[test]
    fn can_fit_february_into_four_weeks() {
        // February 2021 starts on a Monday and has 28 days.
        let grid = build_month_grid(2021, 2, &[], today()).unwrap();
        assert_eq!(grid.weeks.len(), 4);
        assert!(grid.weeks.iter().flatten().all(|cell| !cell.is_placeholder()));
    }

    #[test]
    fn can_mark_only_days_with_assignments() {
        let assignments = vec![
            Assignment::new(1, at("2024-05-15 09:00")),
            Assignment::new(2, at("2024-05-15 23:59")),
        ];

        let grid = build_month_grid(2024, 5, &assignments, today()).unwrap();

        let marked: Vec<u32> = grid
            .days()
            .filter(|cell| cell.has_assignment)
            .map(|cell| cell.day)
            .collect();
        assert_eq!(marked, vec![15]);
    }

    #[test]
    fn can_ignore_assignments_from_other_months() {
        let assignments = vec![
            Assignment::new(1, at("2024-04-15 09:00")),
            Assignment::new(2, at("2023-05-15 09:00")),
        ];

        let grid = build_month_grid(2024, 5, &assignments, today()).unwrap();

        assert!(grid.days().all(|cell| !cell.has_assignment));
    }

    #[test]
    fn can_mark_current_day_only_in_current_month() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        let grid = build_month_grid(2024, 5, &[], today).unwrap();
        let current: Vec<u32> = grid
            .days()
            .filter(|cell| cell.is_current)
            .map(|cell| cell.day)
            .collect();
        assert_eq!(current, vec![20]);
        assert_eq!(grid.current_day, 20);

        let other_year = build_month_grid(2023, 5, &[], today).unwrap();
        assert!(other_year.days().all(|cell| !cell.is_current));
    }

    #[test]
    fn can_navigate_across_year_boundaries() {
        let december = build_month_grid(2024, 12, &[], today()).unwrap();
        assert_eq!(december.next, YearMonth { year: 2025, month: 1 });
        assert_eq!(december.previous, YearMonth { year: 2024, month: 11 });

        let january = build_month_grid(2025, 1, &[], today()).unwrap();
        assert_eq!(january.previous, YearMonth { year: 2024, month: 12 });
        assert_eq!(january.next, YearMonth { year: 2025, month: 2 });
    }

    #[test]
    fn can_list_picker_values() {
        let grid = build_month_grid(2024, 3, &[], today()).unwrap();

        assert_eq!(grid.month_name, "March");
        assert_eq!(grid.months.len(), 12);
        assert_eq!(grid.months[0], (1, "January"));
        assert_eq!(grid.months[11], (12, "December"));
        assert_eq!(grid.years, (2019..=2029).collect::<Vec<_>>());
    }

    #[test]
    fn can_reject_invalid_month() {
        assert_eq!(
            build_month_grid(2024, 13, &[], today()),
            Err(CalendarError::InvalidMonth(13))
        );
        assert_eq!(
            build_month_grid(2024, 0, &[], today()),
            Err(CalendarError::InvalidMonth(0))
        );
    }

    #[test]
    fn can_resolve_month_names() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}
