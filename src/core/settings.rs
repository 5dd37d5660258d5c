use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncouragementLevel {
    Minimal,
    Moderate,
    Maximum,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

impl std::str::FromStr for EncouragementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(EncouragementLevel::Minimal),
            "moderate" => Ok(EncouragementLevel::Moderate),
            "maximum" => Ok(EncouragementLevel::Maximum),
            _ => Err(format!("Unknown encouragement level: {}", s)),
        }
    }
}

/// Focus timer preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusModeSettings {
    #[serde(default = "default_focus_duration")]
    pub default_duration_minutes: u32,
    #[serde(default = "default_true")]
    pub block_notifications: bool,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default = "default_true")]
    pub break_reminders: bool,
}

fn default_focus_duration() -> u32 {
    25
}

fn default_true() -> bool {
    true
}

impl Default for FocusModeSettings {
    fn default() -> Self {
        Self {
            default_duration_minutes: default_focus_duration(),
            block_notifications: true,
            strict_mode: false,
            break_reminders: true,
        }
    }
}

/// Collectible spawning preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub spawn_on_task_complete: bool,
    #[serde(default = "default_true")]
    pub show_spawn_notifications: bool,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_on_task_complete: true,
            show_spawn_notifications: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default = "default_theme")]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub haptic_feedback: bool,
    #[serde(default = "default_encouragement")]
    pub encouragement_level: EncouragementLevel,
    #[serde(default)]
    pub focus_mode: FocusModeSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
}

fn default_theme() -> Theme {
    Theme::Auto
}

fn default_encouragement() -> EncouragementLevel {
    EncouragementLevel::Moderate
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            theme: default_theme(),
            haptic_feedback: true,
            encouragement_level: default_encouragement(),
            focus_mode: FocusModeSettings::default(),
            collection: CollectionSettings::default(),
        }
    }
}

impl AppSettings {
    /// Whether finishing a task should roll for a collectible
    pub fn spawns_on_completion(&self) -> bool {
        self.collection.enabled && self.collection.spawn_on_task_complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.theme, Theme::Auto);
        assert_eq!(settings.focus_mode.default_duration_minutes, 25);
        assert!(settings.spawns_on_completion());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"theme":"dark","collection":{"enabled":false}}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.notifications_enabled);
        assert!(!settings.collection.enabled);
        assert!(settings.collection.spawn_on_task_complete);
        assert!(!settings.spawns_on_completion());
    }
}
