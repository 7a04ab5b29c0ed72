// src/commands/dtos.rs

use crate::limits::CategoryTotals;
use crate::models::{Habit, SiteCategory, SiteRule, UsageLogEntry};
use crate::streak::{CategoryRate, HabitOverview, WeekdayRate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of a log-digital-usage request.
#[derive(Debug, Clone, Deserialize)]
pub struct LogUsageRequest {
    pub site_url: String,
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogUsageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UsageLogEntry>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl LogUsageResponse {
    pub fn logged(entry: UsageLogEntry) -> Self {
        Self {
            success: true,
            data: Some(entry),
            skipped: false,
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: false,
            data: None,
            skipped: true,
        }
    }
}

/// Body of a check-time-limits request.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckTimeLimitsRequest {
    pub site_url: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Body of a usage-log listing request. Every filter is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageLogsRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<SiteCategory>,
    #[serde(default)]
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetSiteRuleRequest {
    pub site_url: String,
    pub site_category: String,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRuleResponse {
    pub id: i64,
    pub site_url: String,
    pub site_category: String,
    pub is_blocked: bool,
}

impl From<SiteRule> for SiteRuleResponse {
    fn from(rule: SiteRule) -> Self {
        Self {
            id: rule.id.unwrap_or(0),
            site_url: rule.site_url,
            site_category: rule.site_category.as_str().to_string(),
            is_blocked: rule.is_blocked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsResponse {
    pub productive_secs: u64,
    pub neutral_secs: u64,
    pub distracting_secs: u64,
    pub top_sites: Vec<SiteStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub productive_secs: u64,
    pub neutral_secs: u64,
    pub distracting_secs: u64,
}

impl DailyStats {
    pub fn new(date: NaiveDate, totals: CategoryTotals) -> Self {
        Self {
            date,
            productive_secs: totals.productive_secs,
            neutral_secs: totals.neutral_secs,
            distracting_secs: totals.distracting_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyStatsResponse {
    pub daily_stats: Vec<DailyStats>,
    pub total_productive_secs: u64,
    pub total_neutral_secs: u64,
    pub total_distracting_secs: u64,
    pub top_sites: Vec<SiteStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteStat {
    pub site_url: String,
    pub duration_secs: u64,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStreakStat {
    pub name: String,
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitInsightsResponse {
    pub streaks: Vec<HabitStreakStat>,
    pub weekday_rates: Vec<WeekdayRate>,
    pub category_rates: Vec<CategoryRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponse {
    pub overview: HabitOverview,
    pub due_today: Vec<Habit>,
    pub incomplete: Vec<Habit>,
}
