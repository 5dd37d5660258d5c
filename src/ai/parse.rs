use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::room::{
    clamp_mess_level, CleaningTask, Difficulty, NewTask, Priority, MAX_TASK_MINUTES,
    QUICK_WIN_MAX_MINUTES,
};

const DEFAULT_MESS_LEVEL: u8 = 50;
const DEFAULT_TASK_MINUTES: u32 = 5;
const DEFAULT_SUMMARY: &str = "Here's a plan to make this space feel calmer.";
const DEFAULT_ENCOURAGEMENT: &str = "Every small step counts. You've got this!";

/// Structured result of a room photo analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAnalysis {
    pub mess_level: u8,
    pub summary: String,
    pub encouragement: String,
    pub quick_wins: Vec<String>,
    pub tasks: Vec<CleaningTask>,
    pub estimated_total_minutes: u32,
    /// True when the fixed plan replaced what the AI sent
    #[serde(default)]
    pub used_fallback: bool,
}

/// Before/after comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressComparison {
    pub progress_percentage: u8,
    pub mess_level_after: Option<u8>,
    pub improvements: Vec<String>,
    pub remaining_issues: Vec<String>,
    pub encouragement: String,
    #[serde(default)]
    pub used_fallback: bool,
}

/// Locate the JSON object inside a model reply.
///
/// Handles ```json fences, bare fences, and prose around a bare object.
pub fn extract_json(text: &str) -> Option<&str> {
    let mut body = text;
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after
            .strip_prefix("json")
            .or_else(|| after.strip_prefix("JSON"))
            .unwrap_or(after);
        body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
    }

    let open = body.find('{')?;
    let close = body.rfind('}')?;
    if close < open {
        return None;
    }
    Some(&body[open..=close])
}

fn parse_object(text: &str) -> Option<Value> {
    let json = extract_json(text)?;
    match serde_json::from_str::<Value>(json) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("AI response is not valid JSON: {}", e);
            None
        }
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Numbers may arrive as JSON numbers or numeric strings
fn number_field(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| value.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn percentage_field(value: &Value, keys: &[&str]) -> Option<u8> {
    number_field(value, keys)
        .filter(|n| n.is_finite())
        .map(|n| clamp_mess_level(n.round() as i64))
}

/// Array of strings, or of objects carrying a `title`
fn string_list(value: &Value, keys: &[&str]) -> Vec<String> {
    let Some(items) = keys.iter().filter_map(|k| value.get(*k)).find_map(|v| v.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => string_field(item, &["title", "text", "name"]),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_task(value: &Value) -> Option<CleaningTask> {
    if !value.is_object() {
        return None;
    }
    let title = string_field(value, &["title", "name", "task"])?;
    let estimated_minutes = number_field(value, &["estimatedMinutes", "estimatedTime", "minutes"])
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.round().min(MAX_TASK_MINUTES as f64) as u32)
        .unwrap_or(DEFAULT_TASK_MINUTES)
        .max(1);
    let priority = Priority::parse_lenient(&string_field(value, &["priority"]).unwrap_or_default());
    let difficulty = Difficulty::parse_lenient(
        &string_field(value, &["difficulty"]).unwrap_or_default(),
        estimated_minutes,
    );

    Some(CleaningTask::new(NewTask {
        title,
        description: string_field(value, &["description", "details"]).unwrap_or_default(),
        emoji: string_field(value, &["emoji"]).unwrap_or_else(|| "✨".to_string()),
        priority,
        difficulty,
        estimated_minutes,
        tips: string_list(value, &["tips"]),
        sub_tasks: string_list(value, &["subtasks", "subTasks", "steps"]),
    }))
}

fn quick_win_titles(tasks: &[CleaningTask]) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| t.estimated_minutes <= QUICK_WIN_MAX_MINUTES)
        .map(|t| t.title.clone())
        .collect()
}

/// Turn any model reply into a usable analysis. Never fails.
///
/// `mess_level` always ends up in 0..=100 and `tasks` is never empty.
pub fn parse_ai_response(text: &str) -> RoomAnalysis {
    let Some(value) = parse_object(text) else {
        tracing::warn!("Could not parse AI analysis, using fallback plan");
        return fallback_analysis();
    };

    let mut used_fallback = false;
    let mut tasks: Vec<CleaningTask> = value
        .get("tasks")
        .and_then(|t| t.as_array())
        .map(|items| items.iter().filter_map(parse_task).collect())
        .unwrap_or_default();
    if tasks.is_empty() {
        tracing::warn!("AI analysis had no usable tasks, using fallback plan");
        tasks = fallback_tasks();
        used_fallback = true;
    }

    let mut quick_wins = string_list(&value, &["quickWins", "quick_wins"]);
    if quick_wins.is_empty() {
        quick_wins = quick_win_titles(&tasks);
    }

    let estimated_total_minutes = number_field(&value, &["estimatedTotalTime", "estimatedTotalMinutes"])
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.round() as u32)
        .unwrap_or_else(|| tasks.iter().map(|t| t.estimated_minutes).sum());

    RoomAnalysis {
        mess_level: percentage_field(&value, &["messLevel", "mess_level"]).unwrap_or(DEFAULT_MESS_LEVEL),
        summary: string_field(&value, &["summary"]).unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        encouragement: string_field(&value, &["encouragement", "motivationalMessage"])
            .unwrap_or_else(|| DEFAULT_ENCOURAGEMENT.to_string()),
        quick_wins,
        tasks,
        estimated_total_minutes,
        used_fallback,
    }
}

struct FallbackTask {
    title: &'static str,
    description: &'static str,
    emoji: &'static str,
    priority: Priority,
    difficulty: Difficulty,
    minutes: u32,
    tips: &'static [&'static str],
    sub_tasks: &'static [&'static str],
}

const FALLBACK_PLAN: [FallbackTask; 5] = [
    FallbackTask {
        title: "Grab a trash bag",
        description: "Walk through the room and collect anything that is obviously trash.",
        emoji: "🗑️",
        priority: Priority::High,
        difficulty: Difficulty::Quick,
        minutes: 5,
        tips: &["Don't sort yet, just bin the obvious stuff"],
        sub_tasks: &["Wrappers and packaging", "Old receipts and papers", "Empty bottles"],
    },
    FallbackTask {
        title: "Gather dishes and cups",
        description: "Collect every dish, cup and glass and take them to the kitchen.",
        emoji: "🍽️",
        priority: Priority::High,
        difficulty: Difficulty::Quick,
        minutes: 2,
        tips: &[],
        sub_tasks: &[],
    },
    FallbackTask {
        title: "Clear one surface",
        description: "Pick the most visible surface and clear it completely.",
        emoji: "🧽",
        priority: Priority::Medium,
        difficulty: Difficulty::Medium,
        minutes: 10,
        tips: &["A clear surface makes the whole room feel tidier"],
        sub_tasks: &["Remove everything", "Wipe it down", "Put back only what belongs"],
    },
    FallbackTask {
        title: "Start a donate box",
        description: "Put anything you no longer use or love into a box to donate.",
        emoji: "📦",
        priority: Priority::Medium,
        difficulty: Difficulty::Medium,
        minutes: 15,
        tips: &["If you haven't used it in a year, it can probably go"],
        sub_tasks: &[],
    },
    FallbackTask {
        title: "Return items to their homes",
        description: "Put things that belong in other rooms back where they live.",
        emoji: "🏠",
        priority: Priority::Low,
        difficulty: Difficulty::Challenging,
        minutes: 20,
        tips: &["Use a laundry basket to carry things between rooms"],
        sub_tasks: &[],
    },
];

/// The fixed five-task plan shown when the AI gives nothing usable
pub fn fallback_tasks() -> Vec<CleaningTask> {
    FALLBACK_PLAN
        .iter()
        .map(|t| {
            CleaningTask::new(NewTask {
                title: t.title.to_string(),
                description: t.description.to_string(),
                emoji: t.emoji.to_string(),
                priority: t.priority,
                difficulty: t.difficulty,
                estimated_minutes: t.minutes,
                tips: t.tips.iter().map(|s| s.to_string()).collect(),
                sub_tasks: t.sub_tasks.iter().map(|s| s.to_string()).collect(),
            })
        })
        .collect()
}

pub fn fallback_analysis() -> RoomAnalysis {
    let tasks = fallback_tasks();
    RoomAnalysis {
        mess_level: DEFAULT_MESS_LEVEL,
        summary: "We couldn't read this photo in detail, but here's a solid plan to get started.".to_string(),
        encouragement: "Let's start with a quick win. Small steps add up!".to_string(),
        quick_wins: quick_win_titles(&tasks),
        estimated_total_minutes: tasks.iter().map(|t| t.estimated_minutes).sum(),
        tasks,
        used_fallback: true,
    }
}

pub fn fallback_comparison() -> ProgressComparison {
    ProgressComparison {
        progress_percentage: DEFAULT_MESS_LEVEL,
        mess_level_after: None,
        improvements: vec!["You put in the work and the space is moving in the right direction.".to_string()],
        remaining_issues: Vec::new(),
        encouragement: "Great effort! Every session makes the next one easier.".to_string(),
        used_fallback: true,
    }
}

/// Same contract as `parse_ai_response`, for before/after comparisons
pub fn parse_comparison_response(text: &str) -> ProgressComparison {
    let Some(value) = parse_object(text) else {
        tracing::warn!("Could not parse progress comparison, using fallback");
        return fallback_comparison();
    };

    ProgressComparison {
        progress_percentage: percentage_field(&value, &["progressPercentage", "progress"])
            .unwrap_or(DEFAULT_MESS_LEVEL),
        mess_level_after: percentage_field(&value, &["messLevelAfter", "messLevel"]),
        improvements: string_list(&value, &["improvements"]),
        remaining_issues: string_list(&value, &["remainingIssues", "remaining"]),
        encouragement: string_field(&value, &["encouragement"])
            .unwrap_or_else(|| DEFAULT_ENCOURAGEMENT.to_string()),
        used_fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "messLevel": 72,
        "summary": "A busy desk with papers everywhere.",
        "encouragement": "You can do this!",
        "quickWins": ["Throw away the empty cans"],
        "estimatedTotalTime": 35,
        "tasks": [
            {
                "title": "Sort the papers",
                "description": "Make keep, shred and recycle piles.",
                "emoji": "📄",
                "priority": "high",
                "difficulty": "medium",
                "estimatedMinutes": 15,
                "tips": ["Use three piles"],
                "subtasks": ["Keep pile", {"title": "Shred pile"}]
            },
            {"title": "Throw away the empty cans", "estimatedMinutes": 2}
        ]
    }"#;

    #[test]
    fn test_parses_plain_json() {
        let analysis = parse_ai_response(SAMPLE);
        assert!(!analysis.used_fallback);
        assert_eq!(analysis.mess_level, 72);
        assert_eq!(analysis.tasks.len(), 2);
        assert_eq!(analysis.estimated_total_minutes, 35);

        let sort = &analysis.tasks[0];
        assert_eq!(sort.priority, Priority::High);
        assert_eq!(sort.sub_tasks.len(), 2);
        assert_eq!(sort.sub_tasks[1].title, "Shred pile");
        assert_eq!(sort.tips, vec!["Use three piles".to_string()]);

        let cans = &analysis.tasks[1];
        assert_eq!(cans.emoji, "✨");
        assert_eq!(cans.difficulty, Difficulty::Quick);
        assert_eq!(cans.priority, Priority::Medium);
    }

    #[test]
    fn test_parses_fenced_json() {
        let text = format!("Here is your plan!\n```json\n{}\n```\nGood luck!", SAMPLE);
        let analysis = parse_ai_response(&text);
        assert!(!analysis.used_fallback);
        assert_eq!(analysis.summary, "A busy desk with papers everywhere.");
    }

    #[test]
    fn test_garbage_uses_fallback() {
        for input in ["", "I can't see a room", "{ broken", "[1, 2, 3]", "} {"] {
            let analysis = parse_ai_response(input);
            assert!(analysis.used_fallback, "input: {:?}", input);
            assert_eq!(analysis.tasks.len(), 5);
            assert!(analysis.mess_level <= 100);
        }
    }

    #[test]
    fn test_mess_level_is_clamped() {
        let analysis = parse_ai_response(r#"{"messLevel": 140, "tasks": [{"title": "Vacuum"}]}"#);
        assert_eq!(analysis.mess_level, 100);

        let analysis = parse_ai_response(r#"{"messLevel": -3, "tasks": [{"title": "Vacuum"}]}"#);
        assert_eq!(analysis.mess_level, 0);

        let analysis = parse_ai_response(r#"{"messLevel": "65%", "tasks": [{"title": "Vacuum"}]}"#);
        assert_eq!(analysis.mess_level, 65);

        let analysis = parse_ai_response(r#"{"messLevel": "very", "tasks": [{"title": "Vacuum"}]}"#);
        assert_eq!(analysis.mess_level, 50);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let analysis = parse_ai_response(r#"{"tasks": [{"title": "Vacuum", "estimatedMinutes": 1}]}"#);
        assert_eq!(analysis.summary, DEFAULT_SUMMARY);
        assert_eq!(analysis.encouragement, DEFAULT_ENCOURAGEMENT);
        assert_eq!(analysis.quick_wins, vec!["Vacuum".to_string()]);
        assert_eq!(analysis.estimated_total_minutes, 1);
    }

    #[test]
    fn test_empty_tasks_use_fallback_plan() {
        let analysis = parse_ai_response(r#"{"messLevel": 30, "summary": "Tidy already", "tasks": [{"description": "no title"}, 7]}"#);
        assert!(analysis.used_fallback);
        assert_eq!(analysis.mess_level, 30);
        assert_eq!(analysis.summary, "Tidy already");
        assert_eq!(analysis.tasks.len(), 5);
    }

    #[test]
    fn test_fallback_plan_has_a_quick_win() {
        let analysis = fallback_analysis();
        assert_eq!(analysis.quick_wins, vec!["Gather dishes and cups".to_string()]);
        assert_eq!(analysis.estimated_total_minutes, 52);
    }

    #[test]
    fn test_comparison_parsing() {
        let comparison = parse_comparison_response(
            r#"```
{"progressPercentage": 80, "improvements": ["Floor is clear"], "remainingIssues": [], "encouragement": "Wow!"}
```"#,
        );
        assert!(!comparison.used_fallback);
        assert_eq!(comparison.progress_percentage, 80);
        assert_eq!(comparison.improvements.len(), 1);
        assert!(comparison.mess_level_after.is_none());

        let comparison = parse_comparison_response("nope");
        assert!(comparison.used_fallback);
    }

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json("xx {\"a\":1} yy"), Some("{\"a\":1}"));
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(extract_json("no braces"), None);
        assert_eq!(extract_json("} before {"), None);
    }
}
