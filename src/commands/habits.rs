use crate::db::{with_connection, Database};
use crate::error::{is_unique_violation, AppError};
use crate::models::{CompletionRecord, Habit, NewHabit};
use crate::streak::{self, StreakSummary};
use crate::validation::{resolve_user_id, validate_habit_title};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::sync::Mutex;

fn find_habit(
    db: &Mutex<Database>,
    user_id: &str,
    habit_id: &str,
    today: NaiveDate,
) -> Result<Habit, AppError> {
    with_connection(db, "load habit", |conn| Habit::find_by_id(conn, user_id, habit_id, today))?
        .ok_or(AppError::NotFound { entity: "Habit" })
}

pub fn list_habits(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<Habit>, AppError> {
    let user_id = resolve_user_id(user_id)?;
    with_connection(db, "load habits", |conn| Habit::find_for_user(conn, &user_id, today))
}

/// Habits listed under "today": daily ones, plus weekly ones on Mondays.
pub fn habits_due_today(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<Habit>, AppError> {
    let habits = list_habits(db, user_id, today)?;
    Ok(habits.into_iter().filter(|h| streak::is_due_on(h, today)).collect())
}

/// Create a habit unless the user already has one with the same title,
/// ignoring case.
pub fn create_habit(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    mut new_habit: NewHabit,
    now: DateTime<Utc>,
) -> Result<Habit, AppError> {
    let user_id = resolve_user_id(user_id)?;
    new_habit.title = validate_habit_title(&new_habit.title)?.to_string();

    let existing = with_connection(db, "load habits", |conn| {
        Habit::find_for_user(conn, &user_id, now.date_naive())
    })?;
    streak::ensure_unique_title(&existing, &new_habit.title)?;

    let habit = Habit::new(&user_id, &new_habit, now);
    with_connection(db, "create habit", |conn| habit.save(conn)).map_err(|e| match e {
        AppError::Database(ref db_err) if is_unique_violation(db_err) => AppError::AlreadyExists {
            name: habit.title.clone(),
        },
        other => other,
    })?;

    info!("Created habit {} ({})", habit.id, habit.frequency.as_str());
    Ok(habit)
}

/// Record today's completion and persist the updated streak.
///
/// A habit can be completed at most once per day; a second call is
/// refused with `AlreadyExists`.
pub fn complete_habit(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    habit_id: &str,
    today: NaiveDate,
) -> Result<Habit, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let mut habit = find_habit(db, &user_id, habit_id, today)?;

    if habit.completed_today {
        return Err(AppError::AlreadyExists {
            name: format!("{} on {today}", habit.title),
        });
    }

    streak::record_completion(&mut habit, today);

    with_connection(db, "record habit completion", |conn| {
        let tx = conn.unchecked_transaction()?;
        CompletionRecord::completed_on(today).insert(&tx, &habit.id, &user_id)?;
        habit.update_streak(&tx)?;
        tx.commit()
    })
    .map_err(|e| match e {
        AppError::Database(ref db_err) if is_unique_violation(db_err) => AppError::AlreadyExists {
            name: format!("{} on {today}", habit.title),
        },
        other => other,
    })?;

    info!("Habit {} completed, streak {}", habit.id, habit.streak);
    Ok(habit)
}

pub fn habit_summary(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    habit_id: &str,
    today: NaiveDate,
) -> Result<StreakSummary, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let habit = find_habit(db, &user_id, habit_id, today)?;
    Ok(streak::summarize(&habit))
}

pub fn delete_habit(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    habit_id: &str,
) -> Result<bool, AppError> {
    let user_id = resolve_user_id(user_id)?;
    with_connection(db, "delete habit", |conn| Habit::delete(conn, &user_id, habit_id))
}
