use crate::db::{with_connection, Database};
use crate::error::AppError;
use crate::models::{SiteCategory, SiteRule};
use crate::validation::{resolve_user_id, validate_site_url};
use log::info;
use std::sync::Mutex;

use super::{SetSiteRuleRequest, SiteRuleResponse};

pub fn get_site_rules(
    db: &Mutex<Database>,
    user_id: Option<&str>,
) -> Result<Vec<SiteRuleResponse>, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let rules = with_connection(db, "load site rules", |conn| {
        SiteRule::find_for_user(conn, &user_id)
    })?;
    Ok(rules.into_iter().map(SiteRuleResponse::from).collect())
}

/// Create or replace the user's rule for a hostname.
pub fn set_site_rule(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    request: &SetSiteRuleRequest,
) -> Result<SiteRuleResponse, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let site_url = validate_site_url(&request.site_url)?;
    let category =
        SiteCategory::parse(&request.site_category).ok_or_else(|| AppError::InvalidInput {
            field: "site_category",
            reason: "must be 'productive', 'neutral', or 'distracting'".into(),
        })?;

    let mut rule = SiteRule::new(&user_id, &site_url, category, request.is_blocked);
    with_connection(db, "save site rule", |conn| rule.save(conn))?;

    info!("Rule for {site_url}: {} (blocked: {})", category.as_str(), rule.is_blocked);
    Ok(SiteRuleResponse::from(rule))
}

pub fn delete_site_rule(
    db: &Mutex<Database>,
    user_id: Option<&str>,
    site_url: &str,
) -> Result<bool, AppError> {
    let user_id = resolve_user_id(user_id)?;
    let site_url = validate_site_url(site_url)?;
    with_connection(db, "delete site rule", |conn| {
        SiteRule::delete(conn, &user_id, &site_url)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn setup() -> (Mutex<Database>, tempfile::TempDir) {
        let (db, dir) = setup_test_db();
        (Mutex::new(db), dir)
    }

    fn request(site_url: &str, category: &str, is_blocked: bool) -> SetSiteRuleRequest {
        SetSiteRuleRequest {
            site_url: site_url.into(),
            site_category: category.into(),
            is_blocked,
        }
    }

    #[test]
    fn test_set_and_get_rules() {
        let (db, _dir) = setup();

        let youtube = request("https://www.youtube.com/watch", "Distracting", false);
        let rule = set_site_rule(&db, None, &youtube).unwrap();
        assert_eq!(rule.site_url, "www.youtube.com");
        assert_eq!(rule.site_category, "distracting");

        let rules = get_site_rules(&db, None).unwrap();
        assert_eq!(rules, vec![rule]);
    }

    #[test]
    fn test_set_rule_rejects_unknown_category() {
        let (db, _dir) = setup();

        let err = set_site_rule(&db, None, &request("reddit.com", "social", false)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: "site_category", .. }));
    }

    #[test]
    fn test_set_rule_replaces_previous() {
        let (db, _dir) = setup();

        set_site_rule(&db, None, &request("reddit.com", "distracting", false)).unwrap();
        set_site_rule(&db, None, &request("reddit.com", "neutral", true)).unwrap();

        let rules = get_site_rules(&db, None).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].site_category, "neutral");
        assert!(rules[0].is_blocked);
    }

    #[test]
    fn test_delete_rule() {
        let (db, _dir) = setup();

        set_site_rule(&db, None, &request("reddit.com", "distracting", false)).unwrap();
        assert!(delete_site_rule(&db, None, "reddit.com").unwrap());
        assert!(get_site_rules(&db, None).unwrap().is_empty());
    }
}
