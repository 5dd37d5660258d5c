use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bonus XP per fully focused minute
pub const FOCUS_XP_PER_MINUTE: u32 = 2;

/// A running focus timer. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    pub duration_minutes: u32,
    pub remaining_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_paused: bool,
    pub paused_at: Option<DateTime<Utc>>,
    pub tasks_completed_during_session: u32,
    pub distraction_attempts: u32,
    pub room_id: Option<String>,
}

/// What a finished (or abandoned) session earned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSummary {
    pub duration_minutes: u32,
    pub focused_minutes: u32,
    pub tasks_completed: u32,
    pub distraction_attempts: u32,
    pub bonus_xp: u32,
    pub completed: bool,
}

impl FocusSession {
    pub fn start(duration_minutes: u32, room_id: Option<String>, now: DateTime<Utc>) -> Self {
        FocusSession {
            id: Uuid::new_v4().to_string(),
            duration_minutes,
            remaining_seconds: duration_minutes.saturating_mul(60),
            started_at: now,
            is_active: true,
            is_paused: false,
            paused_at: None,
            tasks_completed_during_session: 0,
            distraction_attempts: 0,
            room_id,
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.is_active && !self.is_paused {
            self.is_paused = true;
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self) {
        if self.is_active && self.is_paused {
            self.is_paused = false;
            self.paused_at = None;
        }
    }

    /// One second of countdown. Returns true once the timer reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.is_active || self.is_paused {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.is_active = false;
            return true;
        }
        false
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.duration_minutes
            .saturating_mul(60)
            .saturating_sub(self.remaining_seconds)
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_seconds() / 60
    }

    pub fn summary(&self) -> FocusSummary {
        let focused_minutes = self.elapsed_minutes();
        FocusSummary {
            duration_minutes: self.duration_minutes,
            focused_minutes,
            tasks_completed: self.tasks_completed_during_session,
            distraction_attempts: self.distraction_attempts,
            bonus_xp: focused_minutes * FOCUS_XP_PER_MINUTE,
            completed: self.remaining_seconds == 0,
        }
    }

    /// `mm:ss` for display
    pub fn remaining_display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_seconds / 60, self.remaining_seconds % 60)
    }
}
