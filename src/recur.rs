use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{Frequency, Recurrence};

/// Due date of the next occurrence, or `None` when the rule has no step
/// function. A custom or absent frequency has no defined step; completion
/// of such a task behaves like completing a non-recurring one.
pub fn next_due_date(due: NaiveDate, rule: &Recurrence) -> Option<NaiveDate> {
    let interval = rule.interval.max(1);
    match rule.frequency {
        Some(Frequency::Daily) => Some(due + Duration::days(i64::from(interval))),
        Some(Frequency::Weekly) => Some(due + Duration::days(i64::from(interval) * 7)),
        Some(Frequency::Monthly) => Some(add_months(due, interval)),
        Some(Frequency::Yearly) => Some(add_months(due, interval * 12)),
        Some(Frequency::Custom) | None => None,
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let last_day = last_day_of_month(year, month);
    let day = std::cmp::min(date.day(), last_day);
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap();
    let last = first_next - Duration::days(1);
    last.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(frequency: Option<Frequency>, interval: u32) -> Recurrence {
        Recurrence {
            frequency,
            interval,
            end_date: None,
            count: None,
            days_of_week: Vec::new(),
            day_of_month: None,
            month_of_year: None,
        }
    }

    #[test]
    fn daily_steps_by_interval_days() {
        let next = next_due_date(date(2025, 6, 10), &rule(Some(Frequency::Daily), 3));
        assert_eq!(next, Some(date(2025, 6, 13)));
    }

    #[test]
    fn weekly_steps_by_seven_times_interval() {
        let next = next_due_date(date(2025, 6, 10), &rule(Some(Frequency::Weekly), 2));
        assert_eq!(next, Some(date(2025, 6, 24)));
    }

    #[test]
    fn monthly_clamps_to_last_day_of_shorter_month() {
        let next = next_due_date(date(2025, 1, 31), &rule(Some(Frequency::Monthly), 1));
        assert_eq!(next, Some(date(2025, 2, 28)));

        // Leap February keeps one more day.
        let next = next_due_date(date(2024, 1, 31), &rule(Some(Frequency::Monthly), 1));
        assert_eq!(next, Some(date(2024, 2, 29)));
    }

    #[test]
    fn monthly_interval_crosses_year_boundary() {
        let next = next_due_date(date(2025, 11, 30), &rule(Some(Frequency::Monthly), 3));
        assert_eq!(next, Some(date(2026, 2, 28)));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let next = next_due_date(date(2024, 2, 29), &rule(Some(Frequency::Yearly), 1));
        assert_eq!(next, Some(date(2025, 2, 28)));

        let next = next_due_date(date(2024, 2, 29), &rule(Some(Frequency::Yearly), 4));
        assert_eq!(next, Some(date(2028, 2, 29)));
    }

    #[test]
    fn custom_and_absent_frequency_have_no_step() {
        assert_eq!(
            next_due_date(date(2025, 6, 10), &rule(Some(Frequency::Custom), 1)),
            None
        );
        assert_eq!(next_due_date(date(2025, 6, 10), &rule(None, 1)), None);
    }

    #[test]
    fn zero_interval_is_treated_as_one() {
        let next = next_due_date(date(2025, 6, 10), &rule(Some(Frequency::Daily), 0));
        assert_eq!(next, Some(date(2025, 6, 11)));
    }
}
