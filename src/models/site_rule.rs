use super::parse_label;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::{Deserialize, Serialize};

/// Productivity classification that sets a site's daily time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteCategory {
    Productive,
    #[default]
    Neutral,
    Distracting,
}

impl SiteCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Productive => "productive",
            Self::Neutral => "neutral",
            Self::Distracting => "distracting",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "productive" => Some(Self::Productive),
            "neutral" => Some(Self::Neutral),
            "distracting" => Some(Self::Distracting),
            _ => None,
        }
    }
}

/// A user's classification of one hostname.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRule {
    pub id: Option<i64>,
    pub user_id: String,
    pub site_url: String,
    pub site_category: SiteCategory,
    pub is_blocked: bool,
}

impl SiteRule {
    pub fn new(
        user_id: &str,
        site_url: &str,
        site_category: SiteCategory,
        is_blocked: bool,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            site_url: site_url.to_string(),
            site_category,
            is_blocked,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let category: String = row.get(3)?;
        Ok(Self {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            site_url: row.get(2)?,
            site_category: parse_label(3, &category, SiteCategory::parse)?,
            is_blocked: row.get::<_, i32>(4)? != 0,
        })
    }

    /// Insert the rule, replacing any existing rule for the same user and hostname.
    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        let id = conn.query_row(
            "INSERT INTO site_rules (user_id, site_url, site_category, is_blocked)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, site_url)
             DO UPDATE SET site_category = excluded.site_category, is_blocked = excluded.is_blocked
             RETURNING id",
            params![
                self.user_id,
                self.site_url,
                self.site_category.as_str(),
                i32::from(self.is_blocked),
            ],
            |row| row.get(0),
        )?;
        self.id = Some(id);
        Ok(())
    }

    pub fn find_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, site_url, site_category, is_blocked
             FROM site_rules WHERE user_id = ?1 ORDER BY site_url",
        )?;

        let rows = stmt.query_map(params![user_id], Self::from_row)?;
        rows.collect()
    }

    pub fn find_for_site(conn: &Connection, user_id: &str, site_url: &str) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, user_id, site_url, site_category, is_blocked
             FROM site_rules WHERE user_id = ?1 AND site_url = ?2",
            params![user_id, site_url],
            Self::from_row,
        )
        .optional()
    }

    pub fn delete(conn: &Connection, user_id: &str, site_url: &str) -> Result<bool> {
        let rows_affected = conn.execute(
            "DELETE FROM site_rules WHERE user_id = ?1 AND site_url = ?2",
            params![user_id, site_url],
        )?;
        Ok(rows_affected > 0)
    }
}
