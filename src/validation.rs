use crate::constants::{
    ANONYMOUS_USER_ID, MAX_HABIT_TITLE_LEN, MAX_SITE_URL_LEN, MAX_TIME_SPENT_SECS,
};
use crate::error::AppError;
use url::Url;
use uuid::Uuid;

/// Hostname of an http(s) URL. Bare hostnames (`reddit.com`,
/// `reddit.com/r/rust`) are accepted as if prefixed with `http://`.
/// Browser-internal pages (`chrome://newtab`, `about:blank`) have none.
pub fn extract_hostname(input: &str) -> Option<String> {
    let input = input.trim();
    let parsed = if input.contains("://") {
        Url::parse(input).ok()?
    } else {
        Url::parse(&format!("http://{input}")).ok()?
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Validate a site URL or hostname, returning the normalized hostname.
pub fn validate_site_url(site_url: &str) -> Result<String, AppError> {
    if site_url.trim().is_empty() {
        return Err(AppError::InvalidInput {
            field: "site_url",
            reason: "cannot be empty".into(),
        });
    }

    let host = extract_hostname(site_url).ok_or_else(|| AppError::InvalidInput {
        field: "site_url",
        reason: format!("'{site_url}' has no hostname"),
    })?;

    if host.len() > MAX_SITE_URL_LEN {
        return Err(AppError::InvalidInput {
            field: "site_url",
            reason: format!("cannot exceed {MAX_SITE_URL_LEN} characters"),
        });
    }
    Ok(host)
}

/// Validate a logged duration in seconds.
pub fn validate_time_spent(secs: i64) -> Result<u64, AppError> {
    if secs > MAX_TIME_SPENT_SECS {
        return Err(AppError::InvalidInput {
            field: "time_spent_seconds",
            reason: "cannot exceed 24 hours".into(),
        });
    }
    u64::try_from(secs).map_err(|_| AppError::InvalidInput {
        field: "time_spent_seconds",
        reason: "cannot be negative".into(),
    })
}

/// Resolve the acting user. A missing or blank id falls back to the
/// anonymous user; anything else must be a UUID.
pub fn resolve_user_id(user_id: Option<&str>) -> Result<String, AppError> {
    match user_id.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok(ANONYMOUS_USER_ID.to_string()),
        Some(id) => Uuid::parse_str(id)
            .map(|uuid| uuid.hyphenated().to_string())
            .map_err(|e| AppError::InvalidInput {
                field: "user_id",
                reason: e.to_string(),
            }),
    }
}

/// Validate habit title.
pub fn validate_habit_title(title: &str) -> Result<&str, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput {
            field: "title",
            reason: "cannot be empty".into(),
        });
    }
    if title.chars().count() > MAX_HABIT_TITLE_LEN {
        return Err(AppError::InvalidInput {
            field: "title",
            reason: format!("cannot exceed {MAX_HABIT_TITLE_LEN} characters"),
        });
    }
    Ok(title)
}
