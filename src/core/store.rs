use chrono::{DateTime, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::collection::{
    find_collectible, spawn_collectible, CollectedItem, CollectionStats, Position, SpawnEvent,
};
use super::error::{Result, StoreError};
use super::focus::{FocusSession, FocusSummary};
use super::mascot::{Mascot, Mood, Personality};
use super::profile::UserProfile;
use super::room::{
    clamp_mess_level, CleaningTask, NewRoom, NewTask, PhotoCapture, PhotoType, Room, RoomUpdate,
};
use super::settings::AppSettings;
use super::stats::{level_for_xp, Badge, UserStats, XP_PER_TASK, XP_ROOM_COMPLETE_BONUS};
use super::storage::{
    KeyValueStorage, ALL_KEYS, API_KEY_KEY, COLLECTION_KEY, COLLECTION_STATS_KEY, MASCOT_KEY,
    ROOMS_KEY, SETTINGS_KEY, STATS_KEY, USER_KEY,
};
use crate::ai::RoomAnalysis;

/// Everything the app knows. Focus session and active spawn are never persisted.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub user: Option<UserProfile>,
    pub rooms: Vec<Room>,
    pub stats: UserStats,
    pub settings: AppSettings,
    pub api_key: Option<String>,
    pub mascot: Option<Mascot>,
    pub focus_session: Option<FocusSession>,
    pub collection: Vec<CollectedItem>,
    pub collection_stats: CollectionStats,
    pub active_spawn: Option<SpawnEvent>,
}

/// Result of `Store::toggle_task`
#[derive(Debug, Clone, Default)]
pub struct ToggleOutcome {
    pub completed: bool,
    pub progress: u8,
    pub xp_gained: u32,
    pub level_up: bool,
    pub room_completed: bool,
    pub new_badges: Vec<Badge>,
    pub spawn: Option<SpawnEvent>,
}

/// The single writer over `AppState`.
///
/// Every action mutates the state and then rewrites the blobs it touched.
/// Write failures are logged and swallowed; the in-memory state stays authoritative.
pub struct Store {
    state: AppState,
    storage: Box<dyn KeyValueStorage>,
}

impl Store {
    /// Read every blob. Missing keys give defaults, malformed ones are logged and replaced.
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let mut stats: UserStats = read_blob(storage.as_ref(), STATS_KEY).unwrap_or_default();
        stats.level = level_for_xp(stats.xp);

        let state = AppState {
            user: read_blob(storage.as_ref(), USER_KEY),
            rooms: read_blob(storage.as_ref(), ROOMS_KEY).unwrap_or_default(),
            stats,
            settings: read_blob(storage.as_ref(), SETTINGS_KEY).unwrap_or_default(),
            api_key: read_api_key(storage.as_ref()),
            mascot: read_blob(storage.as_ref(), MASCOT_KEY),
            focus_session: None,
            collection: read_blob(storage.as_ref(), COLLECTION_KEY).unwrap_or_default(),
            collection_stats: read_blob(storage.as_ref(), COLLECTION_STATS_KEY).unwrap_or_default(),
            active_spawn: None,
        };

        tracing::debug!(
            "Loaded state: {} rooms, {} xp, mascot: {}",
            state.rooms.len(),
            state.stats.xp,
            state.mascot.is_some()
        );

        Store { state, storage }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn rooms(&self) -> &[Room] {
        &self.state.rooms
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.state.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn stats(&self) -> &UserStats {
        &self.state.stats
    }

    pub fn settings(&self) -> &AppSettings {
        &self.state.settings
    }

    pub fn mascot(&self) -> Option<&Mascot> {
        self.state.mascot.as_ref()
    }

    pub fn focus_session(&self) -> Option<&FocusSession> {
        self.state.focus_session.as_ref()
    }

    pub fn active_spawn(&self) -> Option<&SpawnEvent> {
        self.state.active_spawn.as_ref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.state.api_key.as_deref()
    }

    fn room_mut(&mut self, room_id: &str) -> Result<&mut Room> {
        self.state
            .rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))
    }

    // ===== Profile =====

    pub fn complete_onboarding(&mut self, name: &str) -> UserProfile {
        let mut profile = match self.state.user.take() {
            Some(mut existing) => {
                existing.rename(name.to_string());
                existing
            }
            None => UserProfile::new(name.to_string()),
        };
        profile.onboarding_complete = true;
        self.state.user = Some(profile.clone());
        tracing::info!("Onboarding complete for {}", profile.name);
        self.persist(&[USER_KEY]);
        profile
    }

    pub fn update_profile_name(&mut self, name: &str) -> Result<UserProfile> {
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("name must not be empty".to_string()));
        }
        let profile = match self.state.user.as_mut() {
            Some(profile) => {
                profile.rename(name.to_string());
                profile.clone()
            }
            None => {
                let profile = UserProfile::new(name.to_string());
                self.state.user = Some(profile.clone());
                profile
            }
        };
        self.persist(&[USER_KEY]);
        Ok(profile)
    }

    // ===== Rooms =====

    pub fn add_room(&mut self, data: NewRoom) -> Room {
        let room = Room::new(data);
        tracing::info!("Adding room {} ({})", room.name, room.id);
        self.state.rooms.push(room.clone());
        self.persist(&[ROOMS_KEY]);
        room
    }

    pub fn update_room(&mut self, room_id: &str, update: RoomUpdate) -> Result<Room> {
        let room = self.room_mut(room_id)?;
        if let Some(name) = update.name {
            room.name = name;
        }
        if let Some(emoji) = update.emoji {
            room.emoji = emoji;
        }
        if let Some(level) = update.mess_level {
            room.mess_level = clamp_mess_level(level);
        }
        if let Some(summary) = update.ai_summary {
            room.ai_summary = Some(summary);
        }
        if let Some(message) = update.motivational_message {
            room.motivational_message = Some(message);
        }
        let room = room.clone();
        self.persist(&[ROOMS_KEY]);
        Ok(room)
    }

    pub fn delete_room(&mut self, room_id: &str) -> Result<Room> {
        let idx = self
            .state
            .rooms
            .iter()
            .position(|r| r.id == room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        let room = self.state.rooms.remove(idx);
        tracing::info!("Deleted room {}", room.name);
        self.persist(&[ROOMS_KEY]);
        Ok(room)
    }

    pub fn add_photo(&mut self, room_id: &str, uri: &str, photo_type: PhotoType) -> Result<PhotoCapture> {
        let photo = PhotoCapture::new(uri, photo_type);
        self.room_mut(room_id)?.photos.push(photo.clone());
        self.persist(&[ROOMS_KEY]);
        Ok(photo)
    }

    /// Store an AI analysis on the room and append its tasks
    pub fn apply_analysis(&mut self, room_id: &str, analysis: &RoomAnalysis) -> Result<Room> {
        let room = self.room_mut(room_id)?;
        room.mess_level = analysis.mess_level;
        room.ai_summary = Some(analysis.summary.clone());
        room.motivational_message = Some(analysis.encouragement.clone());
        room.last_analyzed_at = Some(Utc::now());
        room.tasks.extend(analysis.tasks.iter().cloned());
        room.recompute_progress();
        let room = room.clone();
        tracing::info!(
            "Applied analysis to {}: mess level {}, {} tasks",
            room.name,
            room.mess_level,
            analysis.tasks.len()
        );
        self.persist(&[ROOMS_KEY]);
        Ok(room)
    }

    // ===== Tasks =====

    pub fn add_task(&mut self, room_id: &str, task: NewTask) -> Result<CleaningTask> {
        let task = CleaningTask::new(task);
        let room = self.room_mut(room_id)?;
        room.tasks.push(task.clone());
        room.recompute_progress();
        self.persist(&[ROOMS_KEY]);
        Ok(task)
    }

    pub fn delete_task(&mut self, room_id: &str, task_id: &str) -> Result<CleaningTask> {
        let room = self.room_mut(room_id)?;
        let idx = room
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
        let task = room.tasks.remove(idx);
        room.recompute_progress();
        self.persist(&[ROOMS_KEY]);
        Ok(task)
    }

    pub fn toggle_task(&mut self, room_id: &str, task_id: &str) -> Result<ToggleOutcome> {
        self.toggle_task_with(room_id, task_id, Utc::now(), &mut rand::thread_rng())
    }

    /// Flip a task's completion.
    ///
    /// Completing grants XP, counters, streak, badges, mascot food and a
    /// collectible roll. Uncompleting only flips the flag back: nothing that
    /// was granted is taken away.
    pub fn toggle_task_with<R: Rng + ?Sized>(
        &mut self,
        room_id: &str,
        task_id: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<ToggleOutcome> {
        let room = self.room_mut(room_id)?;
        let task = room
            .task_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
        let completed = task.toggle(now);
        let minutes = task.estimated_minutes;
        let progress = room.recompute_progress();
        let room_completed = completed && room.all_tasks_done();

        let mut outcome = ToggleOutcome {
            completed,
            progress,
            room_completed,
            ..Default::default()
        };

        if !completed {
            tracing::debug!("Task {} marked incomplete", task_id);
            self.persist(&[ROOMS_KEY]);
            return Ok(outcome);
        }

        let stats = &mut self.state.stats;
        stats.total_tasks_completed = stats.total_tasks_completed.saturating_add(1);
        stats.total_minutes_cleaned = stats.total_minutes_cleaned.saturating_add(minutes);
        stats.record_activity(now.date_naive());

        let mut xp = XP_PER_TASK;
        if room_completed {
            xp += XP_ROOM_COMPLETE_BONUS;
            stats.total_rooms_cleaned = stats.total_rooms_cleaned.saturating_add(1);
            tracing::info!("Room {} fully cleaned", room_id);
        }
        outcome.xp_gained = xp;
        outcome.level_up = stats.add_xp(xp);
        outcome.new_badges = stats.check_badges(now);

        if let Some(mascot) = self.state.mascot.as_mut() {
            mascot.feed(now);
        }

        if let Some(session) = self.state.focus_session.as_mut() {
            if session.is_active {
                session.tasks_completed_during_session += 1;
            }
        }

        if self.state.settings.spawns_on_completion() {
            outcome.spawn = self.roll_spawn(Some(room_id), Some(task_id), now, rng);
        }

        self.persist(&[ROOMS_KEY, STATS_KEY, MASCOT_KEY]);
        Ok(outcome)
    }

    /// Flip a sub-task. No stats side effects.
    pub fn toggle_sub_task(&mut self, room_id: &str, task_id: &str, sub_task_id: &str) -> Result<bool> {
        let room = self.room_mut(room_id)?;
        let task = room
            .task_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
        let sub_task = task
            .sub_tasks
            .iter_mut()
            .find(|s| s.id == sub_task_id)
            .ok_or_else(|| StoreError::SubTaskNotFound(sub_task_id.to_string()))?;
        sub_task.completed = !sub_task.completed;
        let completed = sub_task.completed;
        room.recompute_progress();
        self.persist(&[ROOMS_KEY]);
        Ok(completed)
    }

    pub fn quick_wins(&self, room_id: &str) -> Result<Vec<&CleaningTask>> {
        self.room(room_id)
            .map(|r| r.quick_wins())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))
    }

    /// Average progress across rooms, 0 with no rooms
    pub fn total_progress(&self) -> u8 {
        if self.state.rooms.is_empty() {
            return 0;
        }
        let sum: u32 = self.state.rooms.iter().map(|r| r.current_progress as u32).sum();
        (sum as f64 / self.state.rooms.len() as f64).round() as u8
    }

    /// Zero the streak if a day was missed. Returns true when it was reset.
    pub fn refresh_streak(&mut self, now: DateTime<Utc>) -> bool {
        let reset = self.state.stats.refresh_streak(now.date_naive());
        if reset {
            tracing::info!("Streak reset after a missed day");
            self.persist(&[STATS_KEY]);
        }
        reset
    }

    // ===== Mascot =====

    pub fn adopt_mascot(&mut self, name: &str, personality: Personality) -> Mascot {
        let mascot = Mascot::new(name.to_string(), personality, Utc::now());
        tracing::info!("Adopted mascot {} ({})", mascot.name, personality);
        self.state.mascot = Some(mascot.clone());
        self.persist(&[MASCOT_KEY]);
        mascot
    }

    pub fn feed_mascot(&mut self) -> Result<Mascot> {
        let mascot = self.state.mascot.as_mut().ok_or(StoreError::NoMascot)?;
        mascot.feed(Utc::now());
        let mascot = mascot.clone();
        self.persist(&[MASCOT_KEY]);
        Ok(mascot)
    }

    pub fn interact_with_mascot(&mut self) -> Result<Mascot> {
        let mascot = self.state.mascot.as_mut().ok_or(StoreError::NoMascot)?;
        mascot.interact(Utc::now());
        let mascot = mascot.clone();
        self.persist(&[MASCOT_KEY]);
        Ok(mascot)
    }

    /// Periodic decay. Returns the new mood, or `None` without a mascot.
    pub fn update_mascot_status(&mut self) -> Option<Mood> {
        self.update_mascot_status_at(Utc::now())
    }

    pub fn update_mascot_status_at(&mut self, now: DateTime<Utc>) -> Option<Mood> {
        let mascot = self.state.mascot.as_mut()?;
        let before = mascot.mood;
        mascot.decay(now);
        let mood = mascot.mood;
        if mood != before {
            tracing::debug!("Mascot mood changed: {} -> {}", before, mood);
        }
        self.persist(&[MASCOT_KEY]);
        Some(mood)
    }

    // ===== Collectibles =====

    fn roll_spawn<R: Rng + ?Sized>(
        &mut self,
        room_id: Option<&str>,
        task_id: Option<&str>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<SpawnEvent> {
        let draw: f64 = rng.gen();
        let item = spawn_collectible(draw, self.state.stats.total_tasks_completed)?;
        let position = Position {
            x: rng.gen_range(0.1..0.9),
            y: rng.gen_range(0.2..0.8),
        };
        let spawn = SpawnEvent::new(
            item,
            position,
            room_id.map(str::to_string),
            task_id.map(str::to_string),
            now,
        );
        tracing::info!("{} {} appeared!", item.emoji, item.name);
        self.state.active_spawn = Some(spawn.clone());
        Some(spawn)
    }

    pub fn collect_spawn(&mut self, spawn_id: &str) -> Result<CollectedItem> {
        self.collect_spawn_at(spawn_id, Utc::now())
    }

    pub fn collect_spawn_at(&mut self, spawn_id: &str, now: DateTime<Utc>) -> Result<CollectedItem> {
        let spawn = match self.state.active_spawn.as_ref() {
            Some(spawn) if spawn.id == spawn_id && !spawn.collected => spawn.clone(),
            _ => return Err(StoreError::SpawnNotFound(spawn_id.to_string())),
        };
        if spawn.is_expired(now) {
            self.state.active_spawn = None;
            return Err(StoreError::SpawnExpired(spawn_id.to_string()));
        }
        let item = find_collectible(&spawn.collectible_id)
            .ok_or_else(|| StoreError::SpawnNotFound(spawn.collectible_id.clone()))?;

        let collected = CollectedItem {
            id: Uuid::new_v4().to_string(),
            collectible_id: item.id.to_string(),
            collected_at: now,
            room_id: spawn.room_id.clone(),
            task_id: spawn.task_id.clone(),
        };
        self.state.collection.push(collected.clone());
        self.state
            .collection_stats
            .record(item, &self.state.collection, now);
        self.state.stats.add_xp(item.xp_value);
        self.state.active_spawn = None;

        tracing::info!("Collected {} (+{} XP)", item.name, item.xp_value);
        self.persist(&[COLLECTION_KEY, COLLECTION_STATS_KEY, STATS_KEY]);
        Ok(collected)
    }

    /// Drop the active spawn once its window has passed. Returns true if one was dropped.
    pub fn expire_spawn(&mut self, now: DateTime<Utc>) -> bool {
        match self.state.active_spawn.as_ref() {
            Some(spawn) if spawn.is_expired(now) => {
                tracing::debug!("Spawn {} expired", spawn.id);
                self.state.active_spawn = None;
                true
            }
            _ => false,
        }
    }

    // ===== Focus =====

    pub fn start_focus_session(&mut self, duration_minutes: u32, room_id: Option<String>) -> Result<FocusSession> {
        if self.state.focus_session.as_ref().is_some_and(|s| s.is_active) {
            return Err(StoreError::FocusSessionActive);
        }
        if duration_minutes == 0 {
            return Err(StoreError::Invalid("focus duration must be at least one minute".to_string()));
        }
        let session = FocusSession::start(duration_minutes, room_id, Utc::now());
        tracing::info!("Focus session started: {} minutes", duration_minutes);
        self.state.focus_session = Some(session.clone());
        Ok(session)
    }

    pub fn pause_focus_session(&mut self) -> Result<()> {
        let session = self.state.focus_session.as_mut().ok_or(StoreError::NoFocusSession)?;
        session.pause(Utc::now());
        Ok(())
    }

    pub fn resume_focus_session(&mut self) -> Result<()> {
        let session = self.state.focus_session.as_mut().ok_or(StoreError::NoFocusSession)?;
        session.resume();
        Ok(())
    }

    pub fn record_distraction(&mut self) -> Result<u32> {
        let session = self.state.focus_session.as_mut().ok_or(StoreError::NoFocusSession)?;
        session.distraction_attempts += 1;
        Ok(session.distraction_attempts)
    }

    /// One second of countdown. Returns the summary when the session just finished.
    pub fn tick_focus(&mut self) -> Option<FocusSummary> {
        let finished = self.state.focus_session.as_mut()?.tick();
        if !finished {
            return None;
        }
        self.finish_focus_session()
    }

    /// Leave the session early. Whole minutes already focused still earn XP.
    pub fn end_focus_session(&mut self) -> Result<FocusSummary> {
        self.finish_focus_session().ok_or(StoreError::NoFocusSession)
    }

    fn finish_focus_session(&mut self) -> Option<FocusSummary> {
        let session = self.state.focus_session.take()?;
        let summary = session.summary();
        if summary.bonus_xp > 0 {
            self.state.stats.add_xp(summary.bonus_xp);
            self.persist(&[STATS_KEY]);
        }
        tracing::info!(
            "Focus session ended after {} minutes (+{} XP)",
            summary.focused_minutes,
            summary.bonus_xp
        );
        Some(summary)
    }

    // ===== Settings =====

    pub fn update_settings(&mut self, settings: AppSettings) {
        self.state.settings = settings;
        self.persist(&[SETTINGS_KEY]);
    }

    pub fn set_api_key(&mut self, key: Option<String>) {
        self.state.api_key = key.filter(|k| !k.trim().is_empty());
        self.persist(&[API_KEY_KEY]);
    }

    /// Wipe every blob and start over
    pub fn reset_all_data(&mut self) {
        for key in ALL_KEYS {
            if let Err(e) = self.storage.remove(key) {
                tracing::error!("Failed to remove {}: {}", key, e);
            }
        }
        self.state = AppState::default();
        tracing::info!("All data reset");
    }

    // ===== Persistence =====

    fn persist(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.write_key(key) {
                tracing::error!("Failed to persist {}: {}", key, e);
            }
        }
    }

    fn write_key(&self, key: &str) -> Result<()> {
        match key {
            USER_KEY => self.write_optional(key, self.state.user.as_ref()),
            ROOMS_KEY => self.write_blob(key, &self.state.rooms),
            STATS_KEY => self.write_blob(key, &self.state.stats),
            SETTINGS_KEY => self.write_blob(key, &self.state.settings),
            API_KEY_KEY => match self.state.api_key.as_deref() {
                Some(api_key) => self.storage.set(key, api_key),
                None => self.storage.remove(key),
            },
            MASCOT_KEY => self.write_optional(key, self.state.mascot.as_ref()),
            COLLECTION_KEY => self.write_blob(key, &self.state.collection),
            COLLECTION_STATS_KEY => self.write_blob(key, &self.state.collection_stats),
            _ => Err(StoreError::Invalid(format!("unknown storage key {}", key))),
        }
    }

    fn write_blob<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string(value)?;
        self.storage.set(key, &content)
    }

    fn write_optional<T: Serialize>(&self, key: &str, value: Option<&T>) -> Result<()> {
        match value {
            Some(value) => self.write_blob(key, value),
            None => self.storage.remove(key),
        }
    }
}

fn read_blob<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let content = match storage.get(key) {
        Ok(Some(content)) => content,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed {}: {}", key, e);
            None
        }
    }
}

/// The key is stored as a bare string; older installs wrote it JSON-quoted
fn read_api_key(storage: &dyn KeyValueStorage) -> Option<String> {
    let raw = match storage.get(API_KEY_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!("Failed to read API key: {}", e);
            return None;
        }
    };
    let key = serde_json::from_str::<String>(&raw).unwrap_or(raw);
    let key = key.trim().to_string();
    (!key.is_empty()).then_some(key)
}
