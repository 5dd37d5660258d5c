use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The person using the app. Created once during onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub onboarding_complete: bool,
}

impl UserProfile {
    pub fn new(name: String) -> Self {
        UserProfile {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
            onboarding_complete: false,
        }
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile() {
        let profile = UserProfile::new("Sam".to_string());
        assert_eq!(profile.name, "Sam");
        assert!(!profile.id.is_empty());
        assert!(!profile.onboarding_complete);
    }

    #[test]
    fn test_serializes_camel_case() {
        let profile = UserProfile::new("Sam".to_string());
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("onboardingComplete").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
