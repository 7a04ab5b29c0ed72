//! Daily time-budget decisions for a (site, user, day) triple.
//!
//! Stateless: each call recomputes from the rows it is given, nothing is
//! carried between calls.

use crate::constants::{DISTRACTING_LIMIT_SECS, NEUTRAL_LIMIT_SECS, PRODUCTIVE_LIMIT_SECS};
use crate::models::{SiteCategory, SiteRule, UsageLogEntry};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Display;

/// Outcome of a limit evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitDecision {
    pub limit_exceeded: bool,
    pub time_spent: u64,
    pub time_limit: u64,
    pub category: SiteCategory,
    pub is_blocked: bool,
}

/// Wire shape of a time-limit check. `fallback` and `error` are set only when
/// the rows could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitCheck {
    pub limit_exceeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SiteCategory>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LimitCheck {
    /// Never reports an exceeded limit.
    pub fn fallback(error: impl Display) -> Self {
        Self {
            limit_exceeded: false,
            time_spent: None,
            time_limit: None,
            category: None,
            fallback: true,
            error: Some(error.to_string()),
        }
    }
}

impl From<LimitDecision> for LimitCheck {
    fn from(decision: LimitDecision) -> Self {
        Self {
            limit_exceeded: decision.limit_exceeded,
            time_spent: Some(decision.time_spent),
            time_limit: Some(decision.time_limit),
            category: Some(decision.category),
            fallback: false,
            error: None,
        }
    }
}

/// Seconds spent per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub productive_secs: u64,
    pub neutral_secs: u64,
    pub distracting_secs: u64,
}

impl CategoryTotals {
    fn add(&mut self, category: SiteCategory, secs: u64) {
        let slot = match category {
            SiteCategory::Productive => &mut self.productive_secs,
            SiteCategory::Neutral => &mut self.neutral_secs,
            SiteCategory::Distracting => &mut self.distracting_secs,
        };
        *slot = slot.saturating_add(secs);
    }
}

/// Fixed daily budget per category; 0 means no cap.
pub fn default_limit(category: SiteCategory) -> u64 {
    match category {
        SiteCategory::Productive => PRODUCTIVE_LIMIT_SECS,
        SiteCategory::Neutral => NEUTRAL_LIMIT_SECS,
        SiteCategory::Distracting => DISTRACTING_LIMIT_SECS,
    }
}

fn find_rule<'a>(site_url: &str, rules: &'a [SiteRule]) -> Option<&'a SiteRule> {
    rules
        .iter()
        .find(|rule| rule.site_url.eq_ignore_ascii_case(site_url))
}

/// Category of the rule for exactly this hostname, neutral when there is none.
pub fn resolve_category(site_url: &str, rules: &[SiteRule]) -> SiteCategory {
    find_rule(site_url, rules)
        .map(|rule| rule.site_category)
        .unwrap_or_default()
}

/// Sum of every matching row. Sessions accumulate.
pub fn total_time_today(
    site_url: &str,
    user_id: &str,
    day: NaiveDate,
    logs: &[UsageLogEntry],
) -> u64 {
    logs.iter()
        .filter(|entry| {
            entry.logged_date == day
                && entry.user_id == user_id
                && entry.site_url.eq_ignore_ascii_case(site_url)
        })
        .fold(0u64, |total, entry| total.saturating_add(entry.time_spent_seconds))
}

/// Decide whether `site_url` is over its daily budget for `user_id` on `day`.
///
/// An explicit block always exceeds. Otherwise the limit is exceeded once
/// the accumulated time reaches the category budget; a budget of 0 never
/// triggers.
pub fn evaluate(
    site_url: &str,
    user_id: &str,
    day: NaiveDate,
    logs: &[UsageLogEntry],
    rules: &[SiteRule],
) -> LimitDecision {
    let rule = find_rule(site_url, rules);
    let category = rule.map(|r| r.site_category).unwrap_or_default();
    let is_blocked = rule.is_some_and(|r| r.is_blocked);
    let time_spent = total_time_today(site_url, user_id, day, logs);
    let time_limit = default_limit(category);

    LimitDecision {
        limit_exceeded: is_blocked || (time_limit > 0 && time_spent >= time_limit),
        time_spent,
        time_limit,
        category,
        is_blocked,
    }
}

/// Evaluate over rows that may have failed to load. A failed lookup yields
/// the fail-safe response instead of an error.
pub fn check_with_fallback<E: Display>(
    site_url: &str,
    user_id: &str,
    day: NaiveDate,
    lookup: Result<(Vec<UsageLogEntry>, Vec<SiteRule>), E>,
) -> LimitCheck {
    match lookup {
        Ok((logs, rules)) => evaluate(site_url, user_id, day, &logs, &rules).into(),
        Err(e) => {
            log::warn!("Time limit lookup for {site_url} failed, not enforcing: {e}");
            LimitCheck::fallback(e)
        }
    }
}

/// Per-category totals over a set of rows, using the category stored on each row.
pub fn totals_by_category(logs: &[UsageLogEntry]) -> CategoryTotals {
    logs.iter().fold(CategoryTotals::default(), |mut totals, entry| {
        totals.add(entry.site_category, entry.time_spent_seconds);
        totals
    })
}

/// Human-readable duration: `"42 sec"`, `"5 min"`, `"2h 3m"`.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs} sec")
    } else if secs < 3600 {
        format!("{} min", secs / 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
