//! Active-tab dwell tracking as an explicit state machine.
//!
//! The host owns a `TabTrackingState` and feeds it browser events through
//! [`advance`]; each transition that ends a visit hands back the finished
//! [`CompletedVisit`] for logging.

use crate::constants::MIN_LOGGED_SECS;
use crate::validation::extract_hostname;

pub struct TrackerConfig {
    /// Visits must be strictly longer than this to be logged.
    pub min_logged_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_logged_secs: MIN_LOGGED_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVisit {
    pub tab_id: i64,
    pub site_url: String,
    pub started_at_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabTrackingState {
    pub active: Option<ActiveVisit>,
}

impl TabTrackingState {
    pub fn active_site(&self) -> Option<&str> {
        self.active.as_ref().map(|visit| visit.site_url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    /// A tab became the active tab.
    Activated { tab_id: i64, url: String, at_ms: i64 },
    /// A tab navigated to a new URL.
    Updated { tab_id: i64, url: String, at_ms: i64 },
    /// Tracking paused: window blurred, browser idle, or host shutdown.
    Stopped { at_ms: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedVisit {
    pub site_url: String,
    pub time_spent_seconds: u64,
}

impl CompletedVisit {
    pub fn should_log(&self, config: &TrackerConfig) -> bool {
        self.time_spent_seconds > config.min_logged_secs
    }
}

/// Whole seconds between two millisecond timestamps, rounded half up.
/// A clock that went backwards counts as 0.
fn elapsed_secs(started_at_ms: i64, ended_at_ms: i64) -> u64 {
    let elapsed_ms = u64::try_from(ended_at_ms.saturating_sub(started_at_ms)).unwrap_or(0);
    elapsed_ms.saturating_add(500) / 1000
}

fn finish(visit: ActiveVisit, at_ms: i64) -> CompletedVisit {
    CompletedVisit {
        time_spent_seconds: elapsed_secs(visit.started_at_ms, at_ms),
        site_url: visit.site_url,
    }
}

fn start(tab_id: i64, url: &str, at_ms: i64) -> TabTrackingState {
    TabTrackingState {
        active: extract_hostname(url).map(|site_url| ActiveVisit {
            tab_id,
            site_url,
            started_at_ms: at_ms,
        }),
    }
}

/// Apply one browser event.
pub fn advance(
    state: TabTrackingState,
    event: TabEvent,
) -> (TabTrackingState, Option<CompletedVisit>) {
    match event {
        TabEvent::Activated { tab_id, url, at_ms } => match state.active {
            Some(visit) if visit.tab_id == tab_id => {
                (TabTrackingState { active: Some(visit) }, None)
            }
            Some(visit) => (start(tab_id, &url, at_ms), Some(finish(visit, at_ms))),
            None => (start(tab_id, &url, at_ms), None),
        },
        TabEvent::Updated { tab_id, url, at_ms } => match state.active {
            Some(visit) if visit.tab_id == tab_id => {
                if extract_hostname(&url).as_deref() == Some(visit.site_url.as_str()) {
                    (TabTrackingState { active: Some(visit) }, None)
                } else {
                    (start(tab_id, &url, at_ms), Some(finish(visit, at_ms)))
                }
            }
            active => (TabTrackingState { active }, None),
        },
        TabEvent::Stopped { at_ms } => (
            TabTrackingState::default(),
            state.active.map(|visit| finish(visit, at_ms)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activated(tab_id: i64, url: &str, at_ms: i64) -> TabEvent {
        TabEvent::Activated { tab_id, url: url.into(), at_ms }
    }

    fn updated(tab_id: i64, url: &str, at_ms: i64) -> TabEvent {
        TabEvent::Updated { tab_id, url: url.into(), at_ms }
    }

    /// State after activating `url` in tab 1 from a fresh start.
    fn watching(url: &str, at_ms: i64) -> TabTrackingState {
        advance(TabTrackingState::default(), activated(1, url, at_ms)).0
    }

    #[test]
    fn test_first_activation_starts_tracking() {
        let (state, visit) =
            advance(TabTrackingState::default(), activated(1, "https://reddit.com/r/rust", 0));
        assert!(visit.is_none());
        assert_eq!(state.active_site(), Some("reddit.com"));
    }

    #[test]
    fn test_switching_tabs_completes_visit() {
        let state = watching("https://reddit.com", 1_000);
        let (state, visit) = advance(state, activated(2, "https://github.com", 61_000));

        assert_eq!(
            visit,
            Some(CompletedVisit { site_url: "reddit.com".into(), time_spent_seconds: 60 })
        );
        assert_eq!(state.active_site(), Some("github.com"));
    }

    #[test]
    fn test_reactivating_same_tab_is_noop() {
        let state = watching("https://reddit.com", 0);
        let (next, visit) = advance(state.clone(), activated(1, "https://reddit.com", 5_000));
        assert!(visit.is_none());
        assert_eq!(next, state);
    }

    #[test]
    fn test_update_on_other_tab_is_ignored() {
        let state = watching("https://reddit.com", 0);
        let (next, visit) = advance(state.clone(), updated(2, "https://github.com", 5_000));
        assert!(visit.is_none());
        assert_eq!(next, state);
    }

    #[test]
    fn test_navigation_within_same_site_keeps_visit() {
        let state = watching("https://reddit.com/r/rust", 0);
        let (next, visit) =
            advance(state.clone(), updated(1, "https://reddit.com/r/golang", 5_000));
        assert!(visit.is_none());
        assert_eq!(next, state);
    }

    #[test]
    fn test_navigation_to_new_site_completes_visit() {
        let state = watching("https://reddit.com", 0);
        let (state, visit) = advance(state, updated(1, "https://docs.rs", 12_400));
        assert_eq!(visit.map(|v| v.time_spent_seconds), Some(12));
        assert_eq!(state.active_site(), Some("docs.rs"));
    }

    #[test]
    fn test_browser_pages_are_not_tracked() {
        let state = watching("https://reddit.com", 0);
        let (state, visit) = advance(state, activated(2, "chrome://newtab", 30_000));
        assert_eq!(visit.map(|v| v.site_url), Some("reddit.com".to_string()));
        assert!(state.active.is_none());

        let (state, visit) = advance(state, activated(3, "https://github.com", 40_000));
        assert!(visit.is_none());
        assert_eq!(state.active_site(), Some("github.com"));
    }

    #[test]
    fn test_stop_completes_and_resets() {
        let state = watching("https://reddit.com", 0);
        let (state, visit) = advance(state, TabEvent::Stopped { at_ms: 2_500 });
        assert_eq!(visit.map(|v| v.time_spent_seconds), Some(3));
        assert_eq!(state, TabTrackingState::default());

        let (_, visit) = advance(state, TabEvent::Stopped { at_ms: 9_000 });
        assert!(visit.is_none());
    }

    #[test]
    fn test_clock_going_backwards_counts_zero() {
        let state = watching("https://reddit.com", 10_000);
        let (_, visit) = advance(state, TabEvent::Stopped { at_ms: 5_000 });
        assert_eq!(visit.map(|v| v.time_spent_seconds), Some(0));
    }

    #[test]
    fn test_should_log_requires_more_than_threshold() {
        let config = TrackerConfig::default();
        let short = CompletedVisit { site_url: "reddit.com".into(), time_spent_seconds: 5 };
        let long = CompletedVisit { site_url: "reddit.com".into(), time_spent_seconds: 6 };
        assert!(!short.should_log(&config));
        assert!(long.should_log(&config));
    }
}
