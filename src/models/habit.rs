use super::parse_label;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitCategory {
    Health,
    Fitness,
    Mindfulness,
    Productivity,
    Learning,
    Social,
    Creativity,
    Finance,
    Other,
}

impl HabitCategory {
    pub const ALL: [Self; 9] = [
        Self::Health,
        Self::Fitness,
        Self::Mindfulness,
        Self::Productivity,
        Self::Learning,
        Self::Social,
        Self::Creativity,
        Self::Finance,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Fitness => "fitness",
            Self::Mindfulness => "mindfulness",
            Self::Productivity => "productivity",
            Self::Learning => "learning",
            Self::Social => "social",
            Self::Creativity => "creativity",
            Self::Finance => "finance",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl HabitFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Anytime,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Anytime => "anytime",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            "anytime" => Some(Self::Anytime),
            _ => None,
        }
    }
}

/// One day a habit was attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompletionRecord {
    pub fn completed_on(date: NaiveDate) -> Self {
        Self {
            date,
            completed: true,
            notes: None,
        }
    }

    pub fn insert(&self, conn: &Connection, habit_id: &str, user_id: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO habit_completions (habit_id, user_id, completion_date, completed, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![habit_id, user_id, self.date, i32::from(self.completed), self.notes],
        )?;
        Ok(())
    }

    /// Completion history for a habit, newest first.
    pub fn find_for_habit(conn: &Connection, habit_id: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT completion_date, completed, notes FROM habit_completions
             WHERE habit_id = ?1 ORDER BY completion_date DESC",
        )?;

        let rows = stmt.query_map(params![habit_id], |row| {
            Ok(Self {
                date: row.get(0)?,
                completed: row.get::<_, i32>(1)? != 0,
                notes: row.get(2)?,
            })
        })?;

        rows.collect()
    }
}

/// Fields supplied when creating a habit.
#[derive(Debug, Clone, Deserialize)]
pub struct NewHabit {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
}

/// A named, recurring intention owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
    pub time_of_day: TimeOfDay,
    pub created_at: DateTime<Utc>,
    pub streak: u32,
    pub longest_streak: u32,
    pub completed_today: bool,
    /// Newest first.
    pub completion_history: Vec<CompletionRecord>,
}

const HABIT_COLUMNS: &str = "id, user_id, title, description, category, frequency, time_of_day,
     created_at, streak, longest_streak";

impl Habit {
    /// A fresh habit with no history, not yet saved.
    pub fn new(user_id: &str, new_habit: &NewHabit, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: new_habit.title.clone(),
            description: new_habit.description.clone(),
            category: new_habit.category,
            frequency: new_habit.frequency,
            time_of_day: new_habit.time_of_day,
            created_at,
            streak: 0,
            longest_streak: 0,
            completed_today: false,
            completion_history: Vec::new(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let category: String = row.get(4)?;
        let frequency: String = row.get(5)?;
        let time_of_day: String = row.get(6)?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category: parse_label(4, &category, HabitCategory::parse)?,
            frequency: parse_label(5, &frequency, HabitFrequency::parse)?,
            time_of_day: parse_label(6, &time_of_day, TimeOfDay::parse)?,
            created_at: row.get(7)?,
            streak: row.get(8)?,
            longest_streak: row.get(9)?,
            completed_today: false,
            completion_history: Vec::new(),
        })
    }

    fn load_history(mut self, conn: &Connection, today: NaiveDate) -> Result<Self> {
        self.completion_history = CompletionRecord::find_for_habit(conn, &self.id)?;
        self.completed_today = self
            .completion_history
            .iter()
            .any(|r| r.completed && r.date == today);
        Ok(self)
    }

    pub fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO habits (id, user_id, title, description, category, frequency,
                                 time_of_day, created_at, streak, longest_streak)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.id,
                self.user_id,
                self.title,
                self.description,
                self.category.as_str(),
                self.frequency.as_str(),
                self.time_of_day.as_str(),
                self.created_at,
                self.streak,
                self.longest_streak,
            ],
        )?;
        Ok(())
    }

    /// Persist the derived streak counters.
    pub fn update_streak(&self, conn: &Connection) -> Result<bool> {
        let rows_affected = conn.execute(
            "UPDATE habits SET streak = ?1, longest_streak = ?2 WHERE id = ?3",
            params![self.streak, self.longest_streak, self.id],
        )?;
        Ok(rows_affected > 0)
    }

    /// All of a user's habits with history loaded, newest habit first.
    pub fn find_for_user(conn: &Connection, user_id: &str, today: NaiveDate) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let habits = stmt
            .query_map(params![user_id], Self::from_row)?
            .collect::<Result<Vec<_>>>()?;

        habits
            .into_iter()
            .map(|habit| habit.load_history(conn, today))
            .collect()
    }

    pub fn find_by_id(
        conn: &Connection,
        user_id: &str,
        id: &str,
        today: NaiveDate,
    ) -> Result<Option<Self>> {
        let habit = conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
                Self::from_row,
            )
            .optional()?;

        habit.map(|h| h.load_history(conn, today)).transpose()
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let rows_affected = conn.execute(
            "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows_affected > 0)
    }
}
