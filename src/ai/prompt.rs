use crate::core::RoomType;

pub const SYSTEM_PROMPT: &str = r#"You are a warm, practical decluttering coach helping people who feel overwhelmed by mess, including people with ADHD.
Look at the photo and break the cleanup into small, concrete, achievable tasks.
Never shame the user. Celebrate small steps. Prefer tasks that take 2-15 minutes.

Respond ONLY with a JSON object of this shape:
{
  "messLevel": <number 0-100>,
  "summary": "<one or two sentences describing the room>",
  "encouragement": "<short motivating message>",
  "quickWins": ["<task that takes 2 minutes or less>", ...],
  "estimatedTotalTime": <minutes>,
  "tasks": [
    {
      "title": "<short imperative title>",
      "description": "<what exactly to do>",
      "emoji": "<single emoji>",
      "priority": "high" | "medium" | "low",
      "difficulty": "quick" | "medium" | "challenging",
      "estimatedMinutes": <number>,
      "tips": ["<optional tip>", ...],
      "subtasks": ["<optional smaller step>", ...]
    }
  ]
}"#;

pub const COMPARISON_SYSTEM_PROMPT: &str = r#"You are a supportive decluttering coach comparing a BEFORE photo (first image) with an AFTER photo (second image) of the same space.
Focus on what improved. Be specific and encouraging.

Respond ONLY with a JSON object of this shape:
{
  "progressPercentage": <number 0-100>,
  "messLevelAfter": <number 0-100>,
  "improvements": ["<visible improvement>", ...],
  "remainingIssues": ["<what is left, phrased kindly>", ...],
  "encouragement": "<short celebration message>"
}"#;

/// Extra context sent with a room photo
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub room_name: Option<String>,
    pub room_type: Option<RoomType>,
    pub notes: Option<String>,
    /// Minutes the user has right now
    pub available_minutes: Option<u32>,
}

pub fn room_analysis_prompt(context: &AnalysisContext) -> String {
    let mut prompt = String::from("Analyze this room photo and create a decluttering plan.");

    if let Some(room_type) = context.room_type {
        prompt.push_str(&format!(" The room is a {}.", room_type));
    }
    if let Some(name) = &context.room_name {
        prompt.push_str(&format!(" The user calls it \"{}\".", name));
    }
    if let Some(minutes) = context.available_minutes {
        prompt.push_str(&format!(
            " The user has about {} minutes right now, so put the most impactful tasks first.",
            minutes
        ));
    }
    if let Some(notes) = context.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        prompt.push_str(&format!(" Additional notes from the user: {}", notes.trim()));
    }

    prompt
}

pub fn comparison_prompt(context: &AnalysisContext) -> String {
    let mut prompt = String::from("Compare these before and after photos and describe the progress.");
    if let Some(name) = &context.room_name {
        prompt.push_str(&format!(" The space is \"{}\".", name));
    }
    prompt
}

pub fn motivation_prompt(context: &str) -> String {
    format!(
        "Write one short, upbeat sentence (under 20 words) to motivate someone who is decluttering. Context: {}. Reply with the sentence only.",
        context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_prompt_includes_context() {
        let prompt = room_analysis_prompt(&AnalysisContext {
            room_name: Some("Den".to_string()),
            room_type: Some(RoomType::LivingRoom),
            notes: Some("  lots of cables ".to_string()),
            available_minutes: Some(15),
        });
        assert!(prompt.contains("living room"));
        assert!(prompt.contains("\"Den\""));
        assert!(prompt.contains("15 minutes"));
        assert!(prompt.ends_with("lots of cables"));
    }

    #[test]
    fn test_room_prompt_without_context() {
        let prompt = room_analysis_prompt(&AnalysisContext::default());
        assert_eq!(prompt, "Analyze this room photo and create a decluttering plan.");
    }
}
