use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, PrimitiveDateTime, Time, Weekday};

use crate::Error;

/// Weekly game day of a season.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub time: Time,
    #[serde(default)]
    pub exclude_dates: BTreeSet<Date>,
}

pub fn weekday(day_of_week: u8) -> Result<Weekday, Error> {
    Ok(match day_of_week {
        0 => Weekday::Sunday,
        1 => Weekday::Monday,
        2 => Weekday::Tuesday,
        3 => Weekday::Wednesday,
        4 => Weekday::Thursday,
        5 => Weekday::Friday,
        6 => Weekday::Saturday,
        d => return Err(Error::InvalidDayOfWeek(d)),
    })
}

impl RecurrenceRule {
    pub fn new(day_of_week: u8, time: Time) -> Result<Self, Error> {
        weekday(day_of_week)?;
        Ok(Self {
            day_of_week,
            time,
            exclude_dates: BTreeSet::new(),
        })
    }

    pub fn weekday(&self) -> Result<Weekday, Error> {
        weekday(self.day_of_week)
    }

    /// Game dates between `start` and `end` inclusive, ascending.
    ///
    /// The sequence is anchored on the first `day_of_week` on or after
    /// `start` and steps a week at a time; excluded dates are skipped
    /// without moving the anchor. An empty range yields nothing.
    pub fn game_dates(&self, start: Date, end: Date) -> Result<GameDates<'_>, Error> {
        let weekday = self.weekday()?;
        Ok(GameDates {
            next: first_on_or_after(start, weekday),
            end,
            exclude: &self.exclude_dates,
        })
    }

    /// Whether `date` is one of the dates `game_dates(start, end)` produces.
    pub fn matches(&self, date: Date, start: Date, end: Date) -> Result<bool, Error> {
        Ok(date.weekday() == self.weekday()?
            && start <= date
            && date <= end
            && !self.exclude_dates.contains(&date))
    }

    pub fn kickoff(&self, date: Date) -> PrimitiveDateTime {
        date.with_time(self.time)
    }
}

pub fn game_dates(start: Date, end: Date, rule: &RecurrenceRule) -> Result<Vec<Date>, Error> {
    Ok(rule.game_dates(start, end)?.collect())
}

#[derive(Clone, Debug)]
pub struct GameDates<'a> {
    next: Option<Date>,
    end: Date,
    exclude: &'a BTreeSet<Date>,
}

impl Iterator for GameDates<'_> {
    type Item = Date;

    fn next(&mut self) -> Option<Date> {
        loop {
            let cursor = self.next.filter(|d| *d <= self.end)?;
            self.next = cursor.checked_add(Duration::WEEK);
            if !self.exclude.contains(&cursor) {
                return Some(cursor);
            }
        }
    }
}

fn first_on_or_after(start: Date, weekday: Weekday) -> Option<Date> {
    let mut cursor = start;
    while cursor.weekday() != weekday {
        cursor = cursor.next_day()?;
    }
    Some(cursor)
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::{date, time};

    fn friday_rule() -> RecurrenceRule {
        RecurrenceRule::new(5, time!(19:00)).unwrap()
    }

    #[test]
    fn fridays_of_january_2026() {
        let dates = game_dates(date!(2026 - 01 - 02), date!(2026 - 01 - 30), &friday_rule()).unwrap();
        assert_eq!(
            dates,
            vec![
                date!(2026 - 01 - 02),
                date!(2026 - 01 - 09),
                date!(2026 - 01 - 16),
                date!(2026 - 01 - 23),
                date!(2026 - 01 - 30),
            ]
        );
    }

    #[test]
    fn advances_to_first_matching_weekday() {
        // 2026-01-05 is a Monday.
        let dates = game_dates(date!(2026 - 01 - 05), date!(2026 - 01 - 20), &friday_rule()).unwrap();
        assert_eq!(dates, vec![date!(2026 - 01 - 09), date!(2026 - 01 - 16)]);
    }

    #[test]
    fn dates_match_weekday_range_and_weekly_step() {
        let start = date!(2025 - 11 - 13);
        let end = date!(2026 - 03 - 31);
        for day_of_week in 0..=6 {
            let rule = RecurrenceRule::new(day_of_week, time!(18:30)).unwrap();
            let dates = game_dates(start, end, &rule).unwrap();
            assert!(!dates.is_empty());
            for d in dates.iter() {
                assert_eq!(d.weekday().number_days_from_sunday(), day_of_week);
                assert!(start <= *d && *d <= end, "{d} outside [{start}, {end}]");
            }
            for w in dates.windows(2) {
                assert_eq!(w[1] - w[0], Duration::days(7));
            }
        }
    }

    #[test]
    fn inverted_range_is_empty() {
        let dates = game_dates(date!(2026 - 02 - 01), date!(2026 - 01 - 01), &friday_rule()).unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn range_without_weekday_is_empty() {
        // Monday through Wednesday.
        let dates = game_dates(date!(2026 - 01 - 05), date!(2026 - 01 - 07), &friday_rule()).unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn excluded_dates_do_not_shift_the_week() {
        let mut rule = friday_rule();
        rule.exclude_dates.insert(date!(2026 - 01 - 09));
        // Not a Friday, must have no effect.
        rule.exclude_dates.insert(date!(2026 - 01 - 10));
        let dates = game_dates(date!(2026 - 01 - 01), date!(2026 - 01 - 23), &rule).unwrap();
        assert_eq!(
            dates,
            vec![date!(2026 - 01 - 02), date!(2026 - 01 - 16), date!(2026 - 01 - 23)]
        );
    }

    #[test]
    fn invalid_day_of_week() {
        assert_eq!(
            RecurrenceRule::new(7, time!(19:00)),
            Err(Error::InvalidDayOfWeek(7))
        );
        let rule = RecurrenceRule {
            day_of_week: 9,
            time: time!(19:00),
            exclude_dates: BTreeSet::new(),
        };
        assert_eq!(
            game_dates(date!(2026 - 01 - 01), date!(2026 - 02 - 01), &rule),
            Err(Error::InvalidDayOfWeek(9))
        );
    }

    #[test]
    fn restartable() {
        let rule = friday_rule();
        let start = date!(2026 - 01 - 01);
        let end = date!(2026 - 06 - 30);
        let first: Vec<_> = rule.game_dates(start, end).unwrap().collect();
        let second: Vec<_> = rule.game_dates(start, end).unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 26);
    }

    #[test]
    fn end_of_calendar_terminates() {
        let rule = RecurrenceRule::new(
            Date::MAX.weekday().number_days_from_sunday(),
            time!(12:00),
        )
        .unwrap();
        let start = Date::MAX - Duration::days(20);
        let dates = game_dates(start, Date::MAX, &rule).unwrap();
        assert_eq!(dates.last(), Some(&Date::MAX));
        assert_eq!(dates.len(), 3);
    }

    #[test]
    fn matches_generated_dates_only() {
        let mut rule = friday_rule();
        rule.exclude_dates.insert(date!(2026 - 01 - 16));
        let start = date!(2026 - 01 - 02);
        let end = date!(2026 - 01 - 30);
        assert!(rule.matches(date!(2026 - 01 - 09), start, end).unwrap());
        assert!(!rule.matches(date!(2026 - 01 - 16), start, end).unwrap());
        assert!(!rule.matches(date!(2026 - 01 - 10), start, end).unwrap());
        assert!(!rule.matches(date!(2026 - 02 - 06), start, end).unwrap());
    }

    #[test]
    fn kickoff_combines_date_and_time() {
        let kickoff = friday_rule().kickoff(date!(2026 - 01 - 02));
        assert_eq!(kickoff.date(), date!(2026 - 01 - 02));
        assert_eq!(kickoff.time(), time!(19:00));
    }
}
