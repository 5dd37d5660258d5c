use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of room, used for the default emoji and the analysis prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomType {
    Bedroom,
    Kitchen,
    Bathroom,
    LivingRoom,
    Office,
    Garage,
    Closet,
    Other,
}

impl RoomType {
    pub fn emoji(&self) -> &'static str {
        match self {
            RoomType::Bedroom => "🛏️",
            RoomType::Kitchen => "🍳",
            RoomType::Bathroom => "🛁",
            RoomType::LivingRoom => "🛋️",
            RoomType::Office => "💼",
            RoomType::Garage => "🚗",
            RoomType::Closet => "👕",
            RoomType::Other => "🏠",
        }
    }

    pub fn all() -> [RoomType; 8] {
        [
            RoomType::Bedroom,
            RoomType::Kitchen,
            RoomType::Bathroom,
            RoomType::LivingRoom,
            RoomType::Office,
            RoomType::Garage,
            RoomType::Closet,
            RoomType::Other,
        ]
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomType::Bedroom => write!(f, "bedroom"),
            RoomType::Kitchen => write!(f, "kitchen"),
            RoomType::Bathroom => write!(f, "bathroom"),
            RoomType::LivingRoom => write!(f, "living room"),
            RoomType::Office => write!(f, "office"),
            RoomType::Garage => write!(f, "garage"),
            RoomType::Closet => write!(f, "closet"),
            RoomType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "bedroom" => Ok(RoomType::Bedroom),
            "kitchen" => Ok(RoomType::Kitchen),
            "bathroom" => Ok(RoomType::Bathroom),
            "livingroom" | "living" => Ok(RoomType::LivingRoom),
            "office" => Ok(RoomType::Office),
            "garage" => Ok(RoomType::Garage),
            "closet" => Ok(RoomType::Closet),
            "other" => Ok(RoomType::Other),
            _ => Err(format!("Unknown room type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Lenient parse used on AI output; unknown values become `Medium`
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Quick,
    Medium,
    Challenging,
}

impl Difficulty {
    /// Lenient parse used on AI output; falls back to a guess from the time estimate
    pub fn parse_lenient(s: &str, estimated_minutes: u32) -> Self {
        match s.trim().to_lowercase().as_str() {
            "quick" | "easy" => Difficulty::Quick,
            "medium" => Difficulty::Medium,
            "challenging" | "hard" => Difficulty::Challenging,
            _ => Self::from_minutes(estimated_minutes),
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0..=5 => Difficulty::Quick,
            6..=15 => Difficulty::Medium,
            _ => Difficulty::Challenging,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Quick => write!(f, "quick"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Challenging => write!(f, "challenging"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhotoType {
    Before,
    Progress,
    After,
}

impl std::str::FromStr for PhotoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(PhotoType::Before),
            "progress" => Ok(PhotoType::Progress),
            "after" => Ok(PhotoType::After),
            _ => Err(format!("Unknown photo type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCapture {
    pub id: String,
    pub uri: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub photo_type: PhotoType,
}

impl PhotoCapture {
    pub fn new(uri: impl Into<String>, photo_type: PhotoType) -> Self {
        PhotoCapture {
            id: Uuid::new_v4().to_string(),
            uri: uri.into(),
            timestamp: Utc::now(),
            photo_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl SubTask {
    pub fn new(title: impl Into<String>) -> Self {
        SubTask {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_emoji")]
    pub emoji: String,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
}

fn default_task_emoji() -> String {
    "✨".to_string()
}

/// Task fields supplied by the user or the analysis; the id is assigned on insert
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
    pub tips: Vec<String>,
    pub sub_tasks: Vec<String>,
}

impl NewTask {
    pub fn simple(title: impl Into<String>, estimated_minutes: u32) -> Self {
        NewTask {
            title: title.into(),
            description: String::new(),
            emoji: default_task_emoji(),
            priority: Priority::Medium,
            difficulty: Difficulty::from_minutes(estimated_minutes),
            estimated_minutes,
            tips: Vec::new(),
            sub_tasks: Vec::new(),
        }
    }
}

impl CleaningTask {
    pub fn new(task: NewTask) -> Self {
        CleaningTask {
            id: Uuid::new_v4().to_string(),
            title: task.title,
            description: task.description,
            emoji: task.emoji,
            priority: task.priority,
            difficulty: task.difficulty,
            estimated_minutes: task.estimated_minutes,
            completed: false,
            completed_at: None,
            tips: task.tips,
            sub_tasks: task.sub_tasks.into_iter().map(SubTask::new).collect(),
        }
    }

    /// Flip the completion flag. Returns the new value.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(now) } else { None };
        self.completed
    }

    pub fn is_quick_win(&self) -> bool {
        self.estimated_minutes <= QUICK_WIN_MAX_MINUTES
    }
}

/// Tasks at or under this estimate count as quick wins
pub const QUICK_WIN_MAX_MINUTES: u32 = 2;

/// Longest estimate a single task may carry
pub const MAX_TASK_MINUTES: u32 = 480;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<PhotoCapture>,
    #[serde(default)]
    pub tasks: Vec<CleaningTask>,
    #[serde(default)]
    pub mess_level: u8,
    #[serde(default)]
    pub current_progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivational_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

/// Input for `Store::add_room`
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub room_type: RoomType,
    pub emoji: Option<String>,
}

/// Partial update for `Store::update_room`; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub mess_level: Option<i64>,
    pub ai_summary: Option<String>,
    pub motivational_message: Option<String>,
}

impl Room {
    pub fn new(data: NewRoom) -> Self {
        let emoji = data
            .emoji
            .unwrap_or_else(|| data.room_type.emoji().to_string());
        Room {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            room_type: data.room_type,
            emoji,
            created_at: Utc::now(),
            photos: Vec::new(),
            tasks: Vec::new(),
            mess_level: 0,
            current_progress: 0,
            ai_summary: None,
            motivational_message: None,
            last_analyzed_at: None,
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&CleaningTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut CleaningTask> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Recompute `current_progress` from the task list and return it
    pub fn recompute_progress(&mut self) -> u8 {
        self.current_progress = calculate_progress(self.completed_count(), self.tasks.len());
        self.current_progress
    }

    /// Every task done, without the rounding in `current_progress`
    pub fn all_tasks_done(&self) -> bool {
        !self.tasks.is_empty() && self.completed_count() == self.tasks.len()
    }

    pub fn quick_wins(&self) -> Vec<&CleaningTask> {
        self.tasks
            .iter()
            .filter(|t| !t.completed && t.is_quick_win())
            .collect()
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.estimated_minutes)
            .sum()
    }
}

/// `round(100 * completed / total)`, 0 for an empty task list
pub fn calculate_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Clamp an arbitrary mess estimate into 0..=100
pub fn clamp_mess_level(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_tasks(n: usize) -> Room {
        let mut room = Room::new(NewRoom {
            name: "Bedroom".to_string(),
            room_type: RoomType::Bedroom,
            emoji: None,
        });
        for i in 0..n {
            room.tasks
                .push(CleaningTask::new(NewTask::simple(format!("Task {}", i), 5)));
        }
        room
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(calculate_progress(0, 0), 0);
        assert_eq!(calculate_progress(1, 3), 33);
        assert_eq!(calculate_progress(2, 3), 67);
        assert_eq!(calculate_progress(3, 3), 100);
        assert_eq!(calculate_progress(1, 8), 13);
    }

    #[test]
    fn test_room_defaults_to_type_emoji() {
        let room = room_with_tasks(0);
        assert_eq!(room.emoji, "🛏️");
        assert_eq!(room.current_progress, 0);
    }

    #[test]
    fn test_toggle_sets_completion_time() {
        let mut room = room_with_tasks(2);
        let id = room.tasks[0].id.clone();
        let task = room.task_mut(&id).unwrap();

        assert!(task.toggle(Utc::now()));
        assert!(task.completed_at.is_some());
        assert!(!task.toggle(Utc::now()));
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_recompute_progress() {
        let mut room = room_with_tasks(4);
        room.tasks[0].completed = true;
        room.tasks[1].completed = true;
        assert_eq!(room.recompute_progress(), 50);
        assert!(!room.all_tasks_done());
    }

    #[test]
    fn test_rounded_progress_is_not_all_done() {
        let mut room = room_with_tasks(200);
        for task in room.tasks.iter_mut().take(199) {
            task.completed = true;
        }
        assert_eq!(room.recompute_progress(), 100);
        assert!(!room.all_tasks_done());

        room.tasks[199].completed = true;
        assert!(room.all_tasks_done());
        assert!(!room_with_tasks(0).all_tasks_done());
    }

    #[test]
    fn test_quick_wins_skip_completed() {
        let mut room = room_with_tasks(0);
        room.tasks.push(CleaningTask::new(NewTask::simple("Bin it", 2)));
        room.tasks.push(CleaningTask::new(NewTask::simple("Fold", 10)));
        room.tasks.push(CleaningTask::new(NewTask::simple("Done", 1)));
        room.tasks[2].completed = true;

        let wins = room.quick_wins();
        assert_eq!(wins.len(), 1);
        assert_eq!(wins[0].title, "Bin it");
        assert_eq!(room.remaining_minutes(), 12);
    }

    #[test]
    fn test_lenient_parsing() {
        assert_eq!(Priority::parse_lenient("HIGH"), Priority::High);
        assert_eq!(Priority::parse_lenient("urgent"), Priority::Medium);
        assert_eq!(Difficulty::parse_lenient("hard", 1), Difficulty::Challenging);
        assert_eq!(Difficulty::parse_lenient("?", 30), Difficulty::Challenging);
        assert_eq!("living room".parse::<RoomType>().unwrap(), RoomType::LivingRoom);
        assert!("attic".parse::<RoomType>().is_err());
    }

    #[test]
    fn test_mess_level_clamp() {
        assert_eq!(clamp_mess_level(-4), 0);
        assert_eq!(clamp_mess_level(250), 100);
        assert_eq!(clamp_mess_level(42), 42);
    }
}
