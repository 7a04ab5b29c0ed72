//! Streak and completion bookkeeping over a habit's completion log.
//!
//! Everything here is a pure function of its inputs. Callers load rows,
//! call in, and persist whatever comes back.

use crate::error::AppError;
use crate::models::{CompletionRecord, Habit, HabitCategory, HabitFrequency};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_rate: f64,
}

/// Headline numbers for a user's habit list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HabitOverview {
    pub total_habits: usize,
    pub completed_today: usize,
    /// Percent of habits completed today, 0 with no habits
    pub today_progress: f64,
    /// Mean current streak, 0 with no habits
    pub average_streak: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayRate {
    pub name: &'static str,
    /// Whole percent, 0-100
    pub rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRate {
    pub category: HabitCategory,
    /// Whole percent of habits in the category completed today
    pub value: u32,
    pub count: usize,
}

fn to_f64(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}

/// `part / whole * 100`, or 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    to_f64(part) / to_f64(whole) * 100.0
}

/// `percent` rounded to the nearest whole number.
fn whole_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    // part <= whole, so the result fits in 0..=100
    let rounded = (part.saturating_mul(100) + whole / 2) / whole;
    u32::try_from(rounded).unwrap_or(100)
}

/// Percentage of records marked completed. Order does not matter; an empty
/// history yields exactly 0.
pub fn completion_rate(history: &[CompletionRecord]) -> f64 {
    let completed = history.iter().filter(|r| r.completed).count();
    percent(completed, history.len())
}

/// Mark the habit completed on `today`.
///
/// Appends unconditionally: calling this twice for the same day counts twice.
/// Streaks are never decremented here or anywhere else, so a missed day does
/// not reset them.
pub fn record_completion(habit: &mut Habit, today: NaiveDate) {
    habit
        .completion_history
        .insert(0, CompletionRecord::completed_on(today));
    habit.completed_today = true;
    habit.streak = habit.streak.saturating_add(1);
    habit.longest_streak = habit.longest_streak.max(habit.streak);
}

pub fn summarize(habit: &Habit) -> StreakSummary {
    StreakSummary {
        current_streak: habit.streak,
        longest_streak: habit.longest_streak,
        completion_rate: completion_rate(&habit.completion_history),
    }
}

/// Reject `title` if an existing habit has the same title after case folding.
pub fn ensure_unique_title(existing: &[Habit], title: &str) -> Result<(), AppError> {
    let folded = title.to_lowercase();
    if existing.iter().any(|h| h.title.to_lowercase() == folded) {
        return Err(AppError::AlreadyExists {
            name: title.to_string(),
        });
    }
    Ok(())
}

pub fn overview(habits: &[Habit]) -> HabitOverview {
    let completed_today = habits.iter().filter(|h| h.completed_today).count();
    let average_streak = if habits.is_empty() {
        0.0
    } else {
        habits.iter().map(|h| f64::from(h.streak)).sum::<f64>() / to_f64(habits.len())
    };

    HabitOverview {
        total_habits: habits.len(),
        completed_today,
        today_progress: percent(completed_today, habits.len()),
        average_streak,
    }
}

/// Habits not yet completed today, in their original order.
pub fn incomplete_today(habits: Vec<Habit>) -> Vec<Habit> {
    habits.into_iter().filter(|h| !h.completed_today).collect()
}

/// Whether the habit shows up in the "today" list on `day`.
pub fn is_due_on(habit: &Habit, day: NaiveDate) -> bool {
    match habit.frequency {
        HabitFrequency::Daily => true,
        HabitFrequency::Weekly => day.weekday() == Weekday::Mon,
        HabitFrequency::Monthly | HabitFrequency::Custom => false,
    }
}

/// Completion rate per weekday across every logged record, Sunday first.
pub fn completion_rate_by_weekday(habits: &[Habit]) -> Vec<WeekdayRate> {
    let mut counts = [0usize; 7];
    let mut completions = [0usize; 7];

    for record in habits.iter().flat_map(|h| &h.completion_history) {
        let idx = usize::try_from(record.date.weekday().num_days_from_sunday()).unwrap_or(0);
        if let Some(count) = counts.get_mut(idx) {
            *count += 1;
        }
        if record.completed {
            if let Some(done) = completions.get_mut(idx) {
                *done += 1;
            }
        }
    }

    WEEKDAY_NAMES
        .into_iter()
        .zip(counts.into_iter().zip(completions))
        .map(|(name, (count, done))| WeekdayRate {
            name,
            rate: whole_percent(done, count),
        })
        .collect()
}

/// Share of habits completed today, per habit category that has any habits.
pub fn completion_rate_by_category(habits: &[Habit]) -> Vec<CategoryRate> {
    HabitCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let in_category: Vec<_> = habits.iter().filter(|h| h.category == category).collect();
            if in_category.is_empty() {
                return None;
            }
            let done = in_category.iter().filter(|h| h.completed_today).count();
            Some(CategoryRate {
                category,
                value: whole_percent(done, in_category.len()),
                count: in_category.len(),
            })
        })
        .collect()
}
