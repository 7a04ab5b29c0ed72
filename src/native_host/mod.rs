//! Chrome native messaging bridge to the browser extension.
//!
//! Each frame is a 4-byte little-endian length followed by that many bytes
//! of UTF-8 JSON. Tab events drive the dwell tracker; the other message
//! types map one-to-one onto the command handlers.

use crate::commands::{
    self, CheckTimeLimitsRequest, DashboardResponse, HabitInsightsResponse, LogUsageRequest,
    LogUsageResponse, SetSiteRuleRequest, SiteRuleResponse, StatsResponse, UsageLogsRequest,
    WeeklyStatsResponse,
};
use crate::constants::{MAX_MESSAGE_SIZE, MAX_TIME_SPENT_SECS};
use crate::db::{safe_lock, Database};
use crate::error::AppError;
use crate::limits::LimitCheck;
use crate::models::{Habit, NewHabit, UsageLogEntry};
use crate::streak::StreakSummary;
use crate::tracker::{self, TabEvent, TabTrackingState, TrackerConfig};
use crate::validation::resolve_user_id;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    SetUserId {
        #[serde(default)]
        user_id: Option<String>,
    },
    TabActivated {
        tab_id: i64,
        url: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    TabUpdated {
        tab_id: i64,
        url: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    TrackingStopped {
        #[serde(default)]
        timestamp: Option<i64>,
    },
    LogDigitalUsage(LogUsageRequest),
    CheckTimeLimits(CheckTimeLimitsRequest),
    GetUsageLogs(UsageLogsRequest),
    GetDashboard,
    GetHabits,
    GetHabitsDueToday,
    CreateHabit(NewHabit),
    CompleteHabit { habit_id: String },
    GetHabitSummary { habit_id: String },
    DeleteHabit { habit_id: String },
    GetSiteRules,
    SetSiteRule(SetSiteRuleRequest),
    DeleteSiteRule { site_url: String },
    GetTodayStats,
    GetWeeklyStats,
    GetHabitInsights,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    UserIdSet { success: bool, user_id: String },
    UsageLogged(LogUsageResponse),
    TimeLimit(LimitCheck),
    UsageLogs { logs: Vec<UsageLogEntry> },
    Dashboard(DashboardResponse),
    Habits { habits: Vec<Habit> },
    Habit { habit: Habit },
    HabitSummary(StreakSummary),
    Deleted { deleted: bool },
    SiteRules { rules: Vec<SiteRuleResponse> },
    SiteRule(SiteRuleResponse),
    TodayStats(StatsResponse),
    WeeklyStats(WeeklyStatsResponse),
    HabitInsights(HabitInsightsResponse),
    Error { message: String },
}

impl From<AppError> for OutgoingMessage {
    fn from(e: AppError) -> Self {
        OutgoingMessage::Error { message: e.into() }
    }
}

/// Per-connection state: the tab being timed and the signed-in user.
#[derive(Debug, Default)]
struct HostState {
    tracking: TabTrackingState,
    user_id: Option<String>,
}

pub struct NativeHost {
    db: Arc<Mutex<Database>>,
    config: TrackerConfig,
    state: Mutex<HostState>,
}

impl NativeHost {
    pub fn new(db: Arc<Mutex<Database>>, config: TrackerConfig) -> Self {
        Self {
            db,
            config,
            state: Mutex::new(HostState::default()),
        }
    }

    /// Serve frames until the browser closes the pipe.
    ///
    /// The visit in progress is logged on a clean shutdown.
    pub fn run<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> io::Result<()> {
        loop {
            let frame = match read_frame(&mut reader) {
                Ok(frame) => frame,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    info!("Browser closed the connection");
                    let stop = IncomingMessage::TrackingStopped { timestamp: None };
                    self.handle_message(stop, Utc::now());
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("Dropped frame: {e}");
                    let reply = OutgoingMessage::Error { message: e.to_string() };
                    write_message(&mut writer, &reply)?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let response = match serde_json::from_slice::<IncomingMessage>(&frame) {
                Ok(message) => self.handle_message(message, Utc::now()),
                Err(e) => {
                    warn!("Unreadable message: {e}");
                    Some(OutgoingMessage::Error {
                        message: format!("Invalid message: {e}"),
                    })
                }
            };

            if let Some(resp) = response {
                write_message(&mut writer, &resp)?;
            }
        }
    }

    pub fn handle_message(
        &self,
        message: IncomingMessage,
        now: DateTime<Utc>,
    ) -> Option<OutgoingMessage> {
        let today = now.date_naive();
        let now_ms = now.timestamp_millis();
        let session_user = self.user_id();
        let user = session_user.as_deref();

        match message {
            IncomingMessage::SetUserId { user_id } => Some(self.set_user_id(user_id.as_deref())),
            IncomingMessage::TabActivated { tab_id, url, timestamp } => {
                let at_ms = timestamp.unwrap_or(now_ms);
                self.track(TabEvent::Activated { tab_id, url, at_ms }, now)
            }
            IncomingMessage::TabUpdated { tab_id, url, timestamp } => {
                let at_ms = timestamp.unwrap_or(now_ms);
                self.track(TabEvent::Updated { tab_id, url, at_ms }, now)
            }
            IncomingMessage::TrackingStopped { timestamp } => {
                let at_ms = timestamp.unwrap_or(now_ms);
                self.track(TabEvent::Stopped { at_ms }, now)
            }
            IncomingMessage::LogDigitalUsage(mut request) => {
                request.user_id = request.user_id.or_else(|| session_user.clone());
                Some(reply(
                    commands::log_digital_usage(&self.db, &self.config, &request, today),
                    OutgoingMessage::UsageLogged,
                ))
            }
            IncomingMessage::CheckTimeLimits(mut request) => {
                request.user_id = request.user_id.or_else(|| session_user.clone());
                Some(reply(
                    commands::check_time_limits(&self.db, &request, today),
                    OutgoingMessage::TimeLimit,
                ))
            }
            IncomingMessage::GetUsageLogs(mut request) => {
                request.user_id = request.user_id.or_else(|| session_user.clone());
                Some(reply(commands::get_usage_logs(&self.db, &request), |logs| {
                    OutgoingMessage::UsageLogs { logs }
                }))
            }
            IncomingMessage::GetDashboard => Some(reply(
                commands::get_dashboard(&self.db, user, today),
                OutgoingMessage::Dashboard,
            )),
            IncomingMessage::GetHabits => Some(reply(
                commands::list_habits(&self.db, user, today),
                |habits| OutgoingMessage::Habits { habits },
            )),
            IncomingMessage::GetHabitsDueToday => Some(reply(
                commands::habits_due_today(&self.db, user, today),
                |habits| OutgoingMessage::Habits { habits },
            )),
            IncomingMessage::CreateHabit(new_habit) => Some(reply(
                commands::create_habit(&self.db, user, new_habit, now),
                |habit| OutgoingMessage::Habit { habit },
            )),
            IncomingMessage::CompleteHabit { habit_id } => Some(reply(
                commands::complete_habit(&self.db, user, &habit_id, today),
                |habit| OutgoingMessage::Habit { habit },
            )),
            IncomingMessage::GetHabitSummary { habit_id } => Some(reply(
                commands::habit_summary(&self.db, user, &habit_id, today),
                OutgoingMessage::HabitSummary,
            )),
            IncomingMessage::DeleteHabit { habit_id } => Some(reply(
                commands::delete_habit(&self.db, user, &habit_id),
                |deleted| OutgoingMessage::Deleted { deleted },
            )),
            IncomingMessage::GetSiteRules => Some(reply(
                commands::get_site_rules(&self.db, user),
                |rules| OutgoingMessage::SiteRules { rules },
            )),
            IncomingMessage::SetSiteRule(request) => Some(reply(
                commands::set_site_rule(&self.db, user, &request),
                OutgoingMessage::SiteRule,
            )),
            IncomingMessage::DeleteSiteRule { site_url } => Some(reply(
                commands::delete_site_rule(&self.db, user, &site_url),
                |deleted| OutgoingMessage::Deleted { deleted },
            )),
            IncomingMessage::GetTodayStats => Some(reply(
                commands::get_today_stats(&self.db, user, today),
                OutgoingMessage::TodayStats,
            )),
            IncomingMessage::GetWeeklyStats => Some(reply(
                commands::get_weekly_stats(&self.db, user, today),
                OutgoingMessage::WeeklyStats,
            )),
            IncomingMessage::GetHabitInsights => Some(reply(
                commands::get_habit_insights(&self.db, user, today),
                OutgoingMessage::HabitInsights,
            )),
        }
    }

    fn user_id(&self) -> Option<String> {
        safe_lock(&self.state, "Host state").user_id.clone()
    }

    fn set_user_id(&self, user_id: Option<&str>) -> OutgoingMessage {
        match resolve_user_id(user_id) {
            Ok(resolved) => {
                info!("Session user set to {resolved}");
                safe_lock(&self.state, "Host state").user_id = Some(resolved.clone());
                OutgoingMessage::UserIdSet {
                    success: true,
                    user_id: resolved,
                }
            }
            Err(e) => e.into(),
        }
    }

    /// Feed a tab event to the tracker and log the visit it closes, if any.
    /// Tab events never get a reply; logging failures stay in the host log.
    fn track(&self, event: TabEvent, now: DateTime<Utc>) -> Option<OutgoingMessage> {
        let (completed, user_id) = {
            let mut state = safe_lock(&self.state, "Host state");
            let (next, completed) = tracker::advance(std::mem::take(&mut state.tracking), event);
            if let Some(site) = next.active_site() {
                debug!("Tracking {site}");
            }
            state.tracking = next;
            (completed, state.user_id.clone())
        };

        let visit = completed?;
        if !visit.should_log(&self.config) {
            debug!("Visit to {} too short to log ({}s)", visit.site_url, visit.time_spent_seconds);
            return None;
        }

        // A tab left open overnight still counts, up to one day per visit
        let elapsed = i64::try_from(visit.time_spent_seconds).unwrap_or(i64::MAX);
        if elapsed > MAX_TIME_SPENT_SECS {
            info!("Visit to {} capped from {elapsed}s to {MAX_TIME_SPENT_SECS}s", visit.site_url);
        }
        let request = LogUsageRequest {
            site_url: visit.site_url,
            time_spent_seconds: elapsed.min(MAX_TIME_SPENT_SECS),
            user_id,
        };
        let today = now.date_naive();
        if let Err(e) = commands::log_digital_usage(&self.db, &self.config, &request, today) {
            warn!("Failed to log visit to {}: {e}", request.site_url);
        }
        None
    }
}

fn reply<T>(
    result: Result<T, AppError>,
    wrap: impl FnOnce(T) -> OutgoingMessage,
) -> OutgoingMessage {
    result.map_or_else(OutgoingMessage::from, wrap)
}

/// Read one length-prefixed frame.
///
/// An oversized frame is skipped and reported as `InvalidData` so the
/// stream stays aligned on the next frame.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    // Chrome Native Messaging protocol specifies little-endian byte order
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes);

    let size = usize::try_from(len).unwrap_or(usize::MAX);
    if size > MAX_MESSAGE_SIZE {
        io::copy(&mut reader.by_ref().take(u64::from(len)), &mut io::sink())?;
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {size} bytes (max: {MAX_MESSAGE_SIZE} bytes)"),
        ));
    }

    let mut buffer = vec![0u8; size];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

pub fn write_message<W: Write>(writer: &mut W, message: &OutgoingMessage) -> io::Result<()> {
    let json = serde_json::to_vec(message)?;
    let len = u32::try_from(json.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Reply too large to frame"))?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()
}
