// src/commands/stats.rs

use crate::db::{with_connection, Database};
use crate::error::AppError;
use crate::limits::{format_duration, totals_by_category};
use crate::models::{Habit, UsageLogEntry};
use crate::streak;
use crate::validation::resolve_user_id;
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    DailyStats, DashboardResponse, HabitInsightsResponse, HabitStreakStat, SiteStat, StatsResponse,
    WeeklyStatsResponse,
};

/// Longest habit name shown in the streak chart before truncation
const STREAK_LABEL_LEN: usize = 15;

pub fn get_today_stats(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    today: NaiveDate,
) -> Result<StatsResponse, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let logs = with_connection(db, "load statistics", |conn| {
        UsageLogEntry::find_in_range(conn, &user_id, today, today)
    })?;

    let totals = totals_by_category(&logs);
    Ok(StatsResponse {
        productive_secs: totals.productive_secs,
        neutral_secs: totals.neutral_secs,
        distracting_secs: totals.distracting_secs,
        top_sites: top_sites(&logs, 5),
    })
}

/// The seven days ending with `today`, oldest first.
pub fn get_weekly_stats(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    today: NaiveDate,
) -> Result<WeeklyStatsResponse, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let week_start = today
        .checked_sub_days(Days::new(6))
        .ok_or_else(|| AppError::Internal(format!("no week before {today}")))?;

    let logs = with_connection(db, "load statistics", |conn| {
        UsageLogEntry::find_in_range(conn, &user_id, week_start, today)
    })?;

    let daily_stats: Vec<DailyStats> = week_start
        .iter_days()
        .take(7)
        .map(|date| {
            let day_logs: Vec<UsageLogEntry> =
                logs.iter().filter(|e| e.logged_date == date).cloned().collect();
            DailyStats::new(date, totals_by_category(&day_logs))
        })
        .collect();

    let totals = totals_by_category(&logs);
    Ok(WeeklyStatsResponse {
        daily_stats,
        total_productive_secs: totals.productive_secs,
        total_neutral_secs: totals.neutral_secs,
        total_distracting_secs: totals.distracting_secs,
        top_sites: top_sites(&logs, 10),
    })
}

pub fn get_habit_insights(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    today: NaiveDate,
) -> Result<HabitInsightsResponse, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let habits = with_connection(db, "load habits", |conn| {
        Habit::find_for_user(conn, &user_id, today)
    })?;

    let streaks = habits
        .iter()
        .map(|habit| HabitStreakStat {
            name: streak_label(&habit.title),
            current: habit.streak,
            longest: habit.longest_streak,
        })
        .collect();

    Ok(HabitInsightsResponse {
        streaks,
        weekday_rates: streak::completion_rate_by_weekday(&habits),
        category_rates: streak::completion_rate_by_category(&habits),
    })
}

/// Headline habit numbers plus the "today" and "incomplete" lists.
pub fn get_dashboard(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    today: NaiveDate,
) -> Result<DashboardResponse, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let habits = with_connection(db, "load habits", |conn| {
        Habit::find_for_user(conn, &user_id, today)
    })?;

    let due_today = habits
        .iter()
        .filter(|h| streak::is_due_on(h, today))
        .cloned()
        .collect();

    Ok(DashboardResponse {
        overview: streak::overview(&habits),
        due_today,
        incomplete: streak::incomplete_today(habits),
    })
}

// Helper functions

fn streak_label(title: &str) -> String {
    if title.chars().count() > STREAK_LABEL_LEN {
        let short: String = title.chars().take(STREAK_LABEL_LEN).collect();
        format!("{short}...")
    } else {
        title.to_string()
    }
}

fn top_sites(logs: &[UsageLogEntry], limit: usize) -> Vec<SiteStat> {
    let mut per_site: HashMap<&str, u64> = HashMap::new();
    for entry in logs {
        let total = per_site.entry(entry.site_url.as_str()).or_insert(0);
        *total = total.saturating_add(entry.time_spent_seconds);
    }

    let mut sites: Vec<(&str, u64)> = per_site.into_iter().collect();
    sites.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    sites
        .into_iter()
        .take(limit)
        .map(|(site_url, duration_secs)| SiteStat {
            site_url: site_url.to_string(),
            duration_secs,
            formatted: format_duration(duration_secs),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ANONYMOUS_USER_ID;
    use crate::models::{
        CompletionRecord, HabitCategory, HabitFrequency, NewHabit, SiteCategory, TimeOfDay,
    };
    use crate::test_utils::setup_test_db;
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup() -> (Mutex<Database>, tempfile::TempDir) {
        let (db, dir) = setup_test_db();
        (Mutex::new(db), dir)
    }

    fn add_log(db: &Mutex<Database>, site: &str, category: SiteCategory, secs: u64, date: &str) {
        let guard = db.lock().unwrap();
        UsageLogEntry::new(site, category, secs, ANONYMOUS_USER_ID, day(date))
            .save(guard.connection())
            .unwrap();
    }

    #[test]
    fn test_today_stats() {
        let (db, _dir) = setup();
        add_log(&db, "docs.rs", SiteCategory::Productive, 600, "2025-04-15");
        add_log(&db, "reddit.com", SiteCategory::Distracting, 300, "2025-04-15");
        add_log(&db, "reddit.com", SiteCategory::Distracting, 400, "2025-04-15");
        add_log(&db, "reddit.com", SiteCategory::Distracting, 999, "2025-04-14");

        let stats = get_today_stats(&db, None, day("2025-04-15")).unwrap();
        assert_eq!(stats.productive_secs, 600);
        assert_eq!(stats.neutral_secs, 0);
        assert_eq!(stats.distracting_secs, 700);
        assert_eq!(stats.top_sites[0].site_url, "reddit.com");
        assert_eq!(stats.top_sites[0].formatted, "11 min");
        assert_eq!(stats.top_sites[1].site_url, "docs.rs");
    }

    #[test]
    fn test_weekly_stats() {
        let (db, _dir) = setup();
        add_log(&db, "docs.rs", SiteCategory::Productive, 60, "2025-04-09");
        add_log(&db, "docs.rs", SiteCategory::Productive, 120, "2025-04-10");
        add_log(&db, "news.example", SiteCategory::Neutral, 30, "2025-04-16");

        let stats = get_weekly_stats(&db, None, day("2025-04-16")).unwrap();
        assert_eq!(stats.daily_stats.len(), 7);
        assert_eq!(stats.daily_stats[0].date, day("2025-04-10"));
        assert_eq!(stats.daily_stats[0].productive_secs, 120);
        assert_eq!(stats.daily_stats[6].neutral_secs, 30);
        assert_eq!(stats.total_productive_secs, 120);
        assert_eq!(stats.total_neutral_secs, 30);
    }

    #[test]
    fn test_habit_insights() {
        let (db, _dir) = setup();
        {
            let guard = db.lock().unwrap();
            let conn = guard.connection();
            let new_habit = NewHabit {
                title: "Drink 8 glasses of water".into(),
                description: None,
                category: HabitCategory::Health,
                frequency: HabitFrequency::Daily,
                time_of_day: TimeOfDay::Anytime,
            };
            let mut habit = Habit::new(ANONYMOUS_USER_ID, &new_habit, Utc::now());
            habit.streak = 5;
            habit.longest_streak = 12;
            habit.save(conn).unwrap();
            CompletionRecord::completed_on(day("2025-04-15"))
                .insert(conn, &habit.id, ANONYMOUS_USER_ID)
                .unwrap();
        }

        let insights = get_habit_insights(&db, None, day("2025-04-15")).unwrap();
        assert_eq!(
            insights.streaks,
            vec![HabitStreakStat { name: "Drink 8 glasses...".into(), current: 5, longest: 12 }]
        );
        // 2025-04-15 is a Tuesday
        assert_eq!(insights.weekday_rates[2].rate, 100);
        assert_eq!(insights.category_rates[0].value, 100);
    }

    fn add_habit(
        db: &Mutex<Database>,
        title: &str,
        frequency: HabitFrequency,
        streak: u32,
    ) -> Habit {
        let guard = db.lock().unwrap();
        let new_habit = NewHabit {
            title: title.into(),
            description: None,
            category: HabitCategory::Productivity,
            frequency,
            time_of_day: TimeOfDay::Anytime,
        };
        let mut habit = Habit::new(ANONYMOUS_USER_ID, &new_habit, Utc::now());
        habit.streak = streak;
        habit.save(guard.connection()).unwrap();
        habit
    }

    #[test]
    fn test_dashboard() {
        let (db, _dir) = setup();
        let inbox = add_habit(&db, "Inbox zero", HabitFrequency::Daily, 6);
        add_habit(&db, "Weekly review", HabitFrequency::Weekly, 2);
        add_habit(&db, "Budget", HabitFrequency::Monthly, 1);
        CompletionRecord::completed_on(day("2025-04-15"))
            .insert(db.lock().unwrap().connection(), &inbox.id, ANONYMOUS_USER_ID)
            .unwrap();

        // 2025-04-15 is a Tuesday
        let dashboard = get_dashboard(&db, None, day("2025-04-15")).unwrap();
        assert_eq!(dashboard.overview.total_habits, 3);
        assert_eq!(dashboard.overview.completed_today, 1);
        assert!((dashboard.overview.today_progress - 33.33).abs() < 0.01);
        assert_eq!(dashboard.overview.average_streak, 3.0);
        assert_eq!(dashboard.due_today.len(), 1);
        assert_eq!(dashboard.due_today[0].title, "Inbox zero");
        assert_eq!(dashboard.incomplete.len(), 2);
        assert!(dashboard.incomplete.iter().all(|h| !h.completed_today));
    }

    #[test]
    fn test_dashboard_without_habits() {
        let (db, _dir) = setup();
        let dashboard = get_dashboard(&db, None, day("2025-04-15")).unwrap();
        assert_eq!(dashboard.overview.today_progress, 0.0);
        assert_eq!(dashboard.overview.average_streak, 0.0);
        assert!(dashboard.due_today.is_empty());
        assert!(dashboard.incomplete.is_empty());
    }

    #[test]
    fn test_streak_label() {
        assert_eq!(streak_label("Read"), "Read");
        assert_eq!(streak_label("Meditate for 10 minutes"), "Meditate for 10...");
    }
}
