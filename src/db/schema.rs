pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS habits (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL,
    frequency TEXT NOT NULL,
    time_of_day TEXT NOT NULL DEFAULT 'anytime',
    created_at TEXT NOT NULL,
    streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS habit_completions (
    id INTEGER PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    completion_date TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 1,
    notes TEXT,
    UNIQUE (habit_id, completion_date)
);

CREATE TABLE IF NOT EXISTS site_rules (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    site_url TEXT NOT NULL,
    site_category TEXT NOT NULL,
    is_blocked INTEGER NOT NULL DEFAULT 0,
    UNIQUE (user_id, site_url)
);

CREATE TABLE IF NOT EXISTS usage_logs (
    id INTEGER PRIMARY KEY,
    site_url TEXT NOT NULL,
    site_category TEXT NOT NULL,
    time_spent_seconds INTEGER NOT NULL CHECK (time_spent_seconds >= 0),
    user_id TEXT NOT NULL,
    logged_date TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_habits_user_title ON habits(user_id, lower(title));
CREATE INDEX IF NOT EXISTS idx_completions_habit ON habit_completions(habit_id, completion_date);
CREATE INDEX IF NOT EXISTS idx_usage_logs_user_date ON usage_logs(user_id, logged_date);
CREATE INDEX IF NOT EXISTS idx_usage_logs_site ON usage_logs(site_url, logged_date);
"#;
