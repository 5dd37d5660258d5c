use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const XP_PER_TASK: u32 = 10;
pub const XP_ROOM_COMPLETE_BONUS: u32 = 50;
pub const XP_PER_LEVEL: u32 = 100;

/// `xp / 100 + 1`
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgeType {
    Tasks,
    Rooms,
    Streak,
    Time,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub requirement: u32,
    #[serde(rename = "type")]
    pub badge_type: BadgeType,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

struct BadgeDef {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    emoji: &'static str,
    requirement: u32,
    badge_type: BadgeType,
}

const BADGE_CATALOG: &[BadgeDef] = &[
    BadgeDef { id: "first-task", name: "First Step", description: "Complete your first task", emoji: "🌱", requirement: 1, badge_type: BadgeType::Tasks },
    BadgeDef { id: "task-10", name: "Getting Going", description: "Complete 10 tasks", emoji: "🧹", requirement: 10, badge_type: BadgeType::Tasks },
    BadgeDef { id: "task-50", name: "Tidy Machine", description: "Complete 50 tasks", emoji: "⚙️", requirement: 50, badge_type: BadgeType::Tasks },
    BadgeDef { id: "task-100", name: "Declutter Master", description: "Complete 100 tasks", emoji: "🏆", requirement: 100, badge_type: BadgeType::Tasks },
    BadgeDef { id: "first-room", name: "Room Rescuer", description: "Finish every task in a room", emoji: "🚪", requirement: 1, badge_type: BadgeType::Rooms },
    BadgeDef { id: "room-5", name: "Home Hero", description: "Finish 5 rooms", emoji: "🏡", requirement: 5, badge_type: BadgeType::Rooms },
    BadgeDef { id: "streak-3", name: "On a Roll", description: "Clean 3 days in a row", emoji: "🔥", requirement: 3, badge_type: BadgeType::Streak },
    BadgeDef { id: "streak-7", name: "Week Warrior", description: "Clean 7 days in a row", emoji: "📅", requirement: 7, badge_type: BadgeType::Streak },
    BadgeDef { id: "streak-30", name: "Habit Formed", description: "Clean 30 days in a row", emoji: "💎", requirement: 30, badge_type: BadgeType::Streak },
    BadgeDef { id: "time-60", name: "Hour of Power", description: "Spend 60 minutes cleaning", emoji: "⏱️", requirement: 60, badge_type: BadgeType::Time },
    BadgeDef { id: "time-300", name: "Marathon Tidier", description: "Spend 300 minutes cleaning", emoji: "🏃", requirement: 300, badge_type: BadgeType::Time },
];

impl BadgeDef {
    fn to_badge(&self) -> Badge {
        Badge {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            emoji: self.emoji.to_string(),
            requirement: self.requirement,
            badge_type: self.badge_type,
            unlocked_at: None,
        }
    }
}

/// Every badge in the catalog, none unlocked
pub fn badge_catalog() -> Vec<Badge> {
    BADGE_CATALOG.iter().map(BadgeDef::to_badge).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub total_tasks_completed: u32,
    #[serde(default)]
    pub total_rooms_cleaned: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub total_minutes_cleaned: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
}

fn default_level() -> u32 {
    1
}

impl Default for UserStats {
    fn default() -> Self {
        UserStats {
            total_tasks_completed: 0,
            total_rooms_cleaned: 0,
            current_streak: 0,
            longest_streak: 0,
            total_minutes_cleaned: 0,
            level: 1,
            xp: 0,
            badges: Vec::new(),
            last_activity_date: None,
        }
    }
}

impl UserStats {
    /// Add XP and keep `level` in sync. Returns true on level up.
    pub fn add_xp(&mut self, amount: u32) -> bool {
        let old_level = self.level;
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for_xp(self.xp);
        self.level > old_level
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }

    fn counter_for(&self, badge_type: BadgeType) -> u32 {
        match badge_type {
            BadgeType::Tasks => self.total_tasks_completed,
            BadgeType::Rooms => self.total_rooms_cleaned,
            BadgeType::Streak => self.current_streak,
            BadgeType::Time => self.total_minutes_cleaned,
        }
    }

    /// Unlock every catalog badge whose requirement is now met.
    /// Owned badges are never touched again. Returns the newly unlocked ones.
    pub fn check_badges(&mut self, now: DateTime<Utc>) -> Vec<Badge> {
        let mut unlocked = Vec::new();
        for def in BADGE_CATALOG {
            if self.has_badge(def.id) {
                continue;
            }
            if self.counter_for(def.badge_type) >= def.requirement {
                let mut badge = def.to_badge();
                badge.unlocked_at = Some(now);
                tracing::info!("Badge unlocked: {}", badge.name);
                self.badges.push(badge.clone());
                unlocked.push(badge);
            }
        }
        unlocked
    }

    /// Register a completed task on `today` for the streak
    pub fn record_activity(&mut self, today: NaiveDate) {
        self.current_streak = match self.last_activity_date {
            Some(last) if last == today => self.current_streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.current_streak.saturating_add(1),
            _ => 1,
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_activity_date = Some(today);
    }

    /// Zero the streak when the last activity is older than yesterday.
    /// Returns true when it was reset.
    pub fn refresh_streak(&mut self, today: NaiveDate) -> bool {
        let Some(last) = self.last_activity_date else {
            return false;
        };
        let gap = (today - last).num_days();
        if gap > 1 && self.current_streak > 0 {
            self.current_streak = 0;
            return true;
        }
        false
    }

    /// (badge, current counter) for every catalog badge, owned or not
    pub fn badge_progress(&self) -> Vec<(Badge, u32)> {
        BADGE_CATALOG
            .iter()
            .map(|def| {
                let badge = self
                    .badges
                    .iter()
                    .find(|b| b.id == def.id)
                    .cloned()
                    .unwrap_or_else(|| def.to_badge());
                (badge, self.counter_for(def.badge_type))
            })
            .collect()
    }
}
