pub mod habit;
pub mod site_rule;
pub mod usage_log;

pub use habit::{CompletionRecord, Habit, HabitCategory, HabitFrequency, NewHabit, TimeOfDay};
pub use site_rule::{SiteCategory, SiteRule};
pub use usage_log::{UsageLogEntry, UsageLogFilter};

use rusqlite::types::Type;

/// Map a stored enum label back to its variant, failing the row on unknown labels.
pub(crate) fn parse_label<T>(
    idx: usize,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown label '{value}'").into(),
        )
    })
}
