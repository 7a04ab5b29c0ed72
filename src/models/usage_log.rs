use super::{parse_label, SiteCategory};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result, Row};
use serde::Serialize;

/// Optional narrowing for [`UsageLogEntry::find_filtered`]. Dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageLogFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<SiteCategory>,
    pub site_url: Option<String>,
}

/// One observed browsing session on a hostname.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageLogEntry {
    pub id: Option<i64>,
    pub site_url: String,
    pub site_category: SiteCategory,
    pub time_spent_seconds: u64,
    pub user_id: String,
    pub logged_date: NaiveDate,
}

impl UsageLogEntry {
    pub fn new(
        site_url: &str,
        site_category: SiteCategory,
        time_spent_seconds: u64,
        user_id: &str,
        logged_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            site_url: site_url.to_string(),
            site_category,
            time_spent_seconds,
            user_id: user_id.to_string(),
            logged_date,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let category: String = row.get(2)?;
        Ok(Self {
            id: Some(row.get(0)?),
            site_url: row.get(1)?,
            site_category: parse_label(2, &category, SiteCategory::parse)?,
            time_spent_seconds: row.get(3)?,
            user_id: row.get(4)?,
            logged_date: row.get(5)?,
        })
    }

    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO usage_logs
                 (site_url, site_category, time_spent_seconds, user_id, logged_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.site_url,
                self.site_category.as_str(),
                self.time_spent_seconds,
                self.user_id,
                self.logged_date,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// All rows for one site, user and day.
    pub fn find_for_site_on(
        conn: &Connection,
        site_url: &str,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, site_url, site_category, time_spent_seconds, user_id, logged_date
             FROM usage_logs WHERE site_url = ?1 AND user_id = ?2 AND logged_date = ?3
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![site_url, user_id, day], Self::from_row)?;
        rows.collect()
    }

    /// All rows for a user with `start <= logged_date <= end`.
    pub fn find_in_range(
        conn: &Connection,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, site_url, site_category, time_spent_seconds, user_id, logged_date
             FROM usage_logs WHERE user_id = ?1 AND logged_date >= ?2 AND logged_date <= ?3
             ORDER BY logged_date, id",
        )?;

        let rows = stmt.query_map(params![user_id, start, end], Self::from_row)?;
        rows.collect()
    }

    /// A user's rows matching every filter that is set, oldest first.
    pub fn find_filtered(
        conn: &Connection,
        user_id: &str,
        filter: &UsageLogFilter,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, site_url, site_category, time_spent_seconds, user_id, logged_date
             FROM usage_logs
             WHERE user_id = ?1
               AND (?2 IS NULL OR logged_date >= ?2)
               AND (?3 IS NULL OR logged_date <= ?3)
               AND (?4 IS NULL OR site_category = ?4)
               AND (?5 IS NULL OR site_url = ?5)
             ORDER BY logged_date, id",
        )?;

        let rows = stmt.query_map(
            params![
                user_id,
                filter.start_date,
                filter.end_date,
                filter.category.map(SiteCategory::as_str),
                filter.site_url,
            ],
            Self::from_row,
        )?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_save_and_find_for_site() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let today = day("2025-04-15");

        let mut entry =
            UsageLogEntry::new("reddit.com", SiteCategory::Distracting, 120, "user-1", today);
        entry.save(conn).unwrap();
        assert!(entry.id.is_some());

        let found = UsageLogEntry::find_for_site_on(conn, "reddit.com", "user-1", today).unwrap();
        assert_eq!(found, vec![entry]);
    }

    #[test]
    fn test_multiple_entries_are_kept() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let today = day("2025-04-15");

        for secs in [100, 200, 50] {
            UsageLogEntry::new("reddit.com", SiteCategory::Distracting, secs, "user-1", today)
                .save(conn)
                .unwrap();
        }

        let found = UsageLogEntry::find_for_site_on(conn, "reddit.com", "user-1", today).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_find_for_site_filters_day_and_user() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        UsageLogEntry::new("reddit.com", SiteCategory::Neutral, 10, "user-1", day("2025-04-14"))
            .save(conn)
            .unwrap();
        UsageLogEntry::new("reddit.com", SiteCategory::Neutral, 10, "user-2", day("2025-04-15"))
            .save(conn)
            .unwrap();

        let found = UsageLogEntry::find_for_site_on(conn, "reddit.com", "user-1", day("2025-04-15"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_find_in_range_is_inclusive() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        for date in ["2025-04-10", "2025-04-12", "2025-04-14", "2025-04-16"] {
            UsageLogEntry::new("docs.rs", SiteCategory::Productive, 60, "user-1", day(date))
                .save(conn)
                .unwrap();
        }

        let (start, end) = (day("2025-04-12"), day("2025-04-14"));
        let found = UsageLogEntry::find_in_range(conn, "user-1", start, end).unwrap();
        let dates: Vec<_> = found.iter().map(|e| e.logged_date).collect();
        assert_eq!(dates, vec![day("2025-04-12"), day("2025-04-14")]);
    }

    #[test]
    fn test_find_filtered() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let rows = [
            ("docs.rs", SiteCategory::Productive, "2025-04-12"),
            ("reddit.com", SiteCategory::Distracting, "2025-04-13"),
            ("reddit.com", SiteCategory::Distracting, "2025-04-15"),
            ("news.example", SiteCategory::Neutral, "2025-04-15"),
        ];
        for (site, category, date) in rows {
            UsageLogEntry::new(site, category, 60, "user-1", day(date))
                .save(conn)
                .unwrap();
        }
        UsageLogEntry::new("reddit.com", SiteCategory::Distracting, 60, "user-2", day("2025-04-15"))
            .save(conn)
            .unwrap();

        let all = UsageLogEntry::find_filtered(conn, "user-1", &UsageLogFilter::default()).unwrap();
        assert_eq!(all.len(), 4);

        let distracting = UsageLogFilter {
            category: Some(SiteCategory::Distracting),
            start_date: Some(day("2025-04-14")),
            ..UsageLogFilter::default()
        };
        let found = UsageLogEntry::find_filtered(conn, "user-1", &distracting).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].logged_date, day("2025-04-15"));

        let by_site = UsageLogFilter {
            site_url: Some("docs.rs".into()),
            end_date: Some(day("2025-04-12")),
            ..UsageLogFilter::default()
        };
        let found = UsageLogEntry::find_filtered(conn, "user-1", &by_site).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].site_url, "docs.rs");
    }
}
