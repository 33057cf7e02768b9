//! 时间设置 handler: `/<YYYY-MM-DD HH:MM:SS>`

use axum::extract::{Path, State};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::api::clock::ClockSetter;
use crate::api::server::AppState;

/// Accepted shape of the requested time.
pub const TIMESTAMP_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$";

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is a valid regex"));

pub fn is_valid_timestamp(candidate: &str) -> bool {
    TIMESTAMP_RE.is_match(candidate)
}

/// Outcome of one request, rendered as the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeChange {
    pub changed: bool,
    pub old_time: String,
    pub new_time: String,
}

impl TimeChange {
    fn unchanged(now: String) -> Self {
        Self { changed: false, old_time: now.clone(), new_time: now }
    }

    /// Fixed-shape body understood by the existing test harness scripts.
    pub fn render(&self) -> String {
        format!(
            "{{\nchanged: {},\noldTime: \"{}\",\nnewTime: \"{}\"\n}}",
            self.changed, self.old_time, self.new_time
        )
    }
}

/// Current local time, e.g. `2021-03-30 05:25:55.123456789 +0200 +02:00`.
pub fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.9f %z %Z").to_string()
}

/// Validate `requested` and, if it matches, set the clock.
pub async fn apply_time_change(clock: &dyn ClockSetter, requested: &str) -> TimeChange {
    let before = now_string();
    if !is_valid_timestamp(requested) {
        warn!(requested, "Rejected malformed timestamp");
        return TimeChange::unchanged(before);
    }
    match clock.set_time(requested).await {
        Ok(()) => {
            let after = now_string();
            info!(requested, old_time = %before, new_time = %after, "System time changed");
            TimeChange { changed: true, old_time: before, new_time: after }
        }
        Err(e) => {
            warn!(requested, error = %e, "Failed to change system time");
            TimeChange::unchanged(before)
        }
    }
}

pub async fn change_time(State(state): State<AppState>, Path(timestamp): Path<String>) -> String {
    apply_time_change(state.clock.as_ref(), &timestamp).await.render()
}

/// `/` carries no timestamp; answer with the unchanged shape.
pub async fn change_time_root(State(state): State<AppState>) -> String {
    apply_time_change(state.clock.as_ref(), "").await.render()
}
