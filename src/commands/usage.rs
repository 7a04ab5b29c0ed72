use crate::db::{with_connection, Database};
use crate::error::AppError;
use crate::limits::{self, LimitCheck};
use crate::models::{SiteRule, UsageLogEntry, UsageLogFilter};
use crate::tracker::TrackerConfig;
use crate::validation::{resolve_user_id, validate_site_url, validate_time_spent};
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Mutex;

use super::{CheckTimeLimitsRequest, LogUsageRequest, LogUsageResponse, UsageLogsRequest};

/// Categorize the site from the user's rules and append a usage row for `today`.
///
/// Sessions no longer than `config.min_logged_secs` are dropped.
pub fn log_digital_usage(
    db: &Mutex<Database>,
    config: &TrackerConfig,
    request: &LogUsageRequest,
    today: NaiveDate,
) -> Result<LogUsageResponse, AppError> {
    let site_url = validate_site_url(&request.site_url)?;
    let time_spent = validate_time_spent(request.time_spent_seconds)?;
    let user_id = resolve_user_id(request.user_id.as_deref())?;

    if time_spent <= config.min_logged_secs {
        debug!("Skipping {time_spent}s visit to {site_url}");
        return Ok(LogUsageResponse::skipped());
    }

    let entry = with_connection(db, "log digital usage", |conn| {
        let rules: Vec<SiteRule> = SiteRule::find_for_site(conn, &user_id, &site_url)?
            .into_iter()
            .collect();
        let category = limits::resolve_category(&site_url, &rules);

        let mut entry = UsageLogEntry::new(&site_url, category, time_spent, &user_id, today);
        entry.save(conn)?;
        Ok(entry)
    })?;

    info!(
        "Logged {}s on {} ({})",
        entry.time_spent_seconds,
        entry.site_url,
        entry.site_category.as_str()
    );
    Ok(LogUsageResponse::logged(entry))
}

/// Evaluate today's budget for a site.
///
/// Malformed requests are rejected. Once the request is valid this never
/// fails: a storage error becomes the fail-safe `limitExceeded: false`
/// response.
pub fn check_time_limits(
    db: &Mutex<Database>,
    request: &CheckTimeLimitsRequest,
    today: NaiveDate,
) -> Result<LimitCheck, AppError> {
    let site_url = validate_site_url(&request.site_url)?;
    let user_id = resolve_user_id(request.user_id.as_deref())?;

    let lookup = with_connection(db, "load time limit data", |conn| {
        let logs = UsageLogEntry::find_for_site_on(conn, &site_url, &user_id, today)?;
        let rules: Vec<SiteRule> = SiteRule::find_for_site(conn, &user_id, &site_url)?
            .into_iter()
            .collect();
        Ok((logs, rules))
    });

    let check = limits::check_with_fallback(&site_url, &user_id, today, lookup);
    if check.limit_exceeded {
        info!("Daily limit reached for {site_url}");
    }
    Ok(check)
}

/// Raw usage rows for the user, narrowed by the optional filters.
pub fn get_usage_logs(
    db: &Mutex<Database>,
    request: &UsageLogsRequest,
) -> Result<Vec<UsageLogEntry>, AppError> {
    let user_id = resolve_user_id(request.user_id.as_deref())?;
    if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
        if start > end {
            return Err(AppError::InvalidInput {
                field: "start_date",
                reason: format!("{start} is after end_date {end}"),
            });
        }
    }

    let filter = UsageLogFilter {
        start_date: request.start_date,
        end_date: request.end_date,
        category: request.category,
        site_url: request.site_url.as_deref().map(validate_site_url).transpose()?,
    };
    with_connection(db, "load usage logs", |conn| {
        UsageLogEntry::find_filtered(conn, &user_id, &filter)
    })
}
