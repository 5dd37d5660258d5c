use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

const HUNGER_DECAY_PER_HOUR: f64 = 5.0;
const ENERGY_RECOVERY_PER_HOUR: f64 = 2.0;
const HAPPINESS_DECAY_PER_HOUR: f64 = 2.0;
/// Happiness only starts dropping after this long without attention
const LONELY_AFTER_HOURS: f64 = 6.0;
const NEGLECTED_AFTER_HOURS: f64 = 24.0;

/// Mascot personality, fixed at adoption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Personality {
    Spunky,
    Calm,
    Wise,
    Silly,
}

impl Personality {
    pub fn emoji(&self) -> &'static str {
        match self {
            Personality::Spunky => "⚡",
            Personality::Calm => "🌿",
            Personality::Wise => "🦉",
            Personality::Silly => "🤪",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Personality::Spunky => "Energetic and always cheering you on",
            Personality::Calm => "Gentle and patient, never rushes you",
            Personality::Wise => "Full of practical tidying wisdom",
            Personality::Silly => "Turns every chore into a game",
        }
    }
}

impl std::str::FromStr for Personality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spunky" => Ok(Personality::Spunky),
            "calm" => Ok(Personality::Calm),
            "wise" => Ok(Personality::Wise),
            "silly" => Ok(Personality::Silly),
            _ => Err(format!("Unknown personality: {}", s)),
        }
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Personality::Spunky => write!(f, "spunky"),
            Personality::Calm => write!(f, "calm"),
            Personality::Wise => write!(f, "wise"),
            Personality::Silly => write!(f, "silly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mood {
    Ecstatic,
    Happy,
    Content,
    Neutral,
    Sad,
    Hungry,
    Sleepy,
}

impl Mood {
    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Ecstatic => "🤩",
            Mood::Happy => "😊",
            Mood::Content => "🙂",
            Mood::Neutral => "😐",
            Mood::Sad => "😢",
            Mood::Hungry => "🍽️",
            Mood::Sleepy => "😴",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mood::Ecstatic => "ecstatic",
            Mood::Happy => "happy",
            Mood::Content => "content",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Hungry => "hungry",
            Mood::Sleepy => "sleepy",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mascot {
    pub name: String,
    pub personality: Personality,
    pub mood: Mood,
    pub hunger: f64,
    pub energy: f64,
    pub happiness: f64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u32,
    pub last_fed: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Point up to which decay has been applied; older blobs fall back to `last_fed`
    #[serde(default)]
    pub last_decay_at: Option<DateTime<Utc>>,
}

fn default_level() -> u32 {
    1
}

fn clamp_stat(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_seconds().max(0) as f64) / 3600.0
}

impl Mascot {
    pub fn new(name: String, personality: Personality, now: DateTime<Utc>) -> Self {
        Mascot {
            name,
            personality,
            mood: Mood::Happy,
            hunger: 80.0,
            energy: 100.0,
            happiness: 80.0,
            level: 1,
            xp: 0,
            last_fed: now,
            last_interaction: now,
            created_at: now,
            last_decay_at: Some(now),
        }
    }

    /// Mood from current stats. Unhappy states win over happy ones.
    pub fn derive_mood(&self, now: DateTime<Utc>) -> Mood {
        let since_interaction = hours_between(self.last_interaction, now);

        if self.hunger < 20.0 {
            Mood::Hungry
        } else if self.energy < 20.0 {
            Mood::Sleepy
        } else if self.happiness < 30.0 || since_interaction > NEGLECTED_AFTER_HOURS {
            Mood::Sad
        } else if self.happiness >= 90.0 && self.hunger >= 70.0 {
            Mood::Ecstatic
        } else if self.happiness >= 70.0 {
            Mood::Happy
        } else if self.happiness >= 50.0 {
            Mood::Content
        } else {
            Mood::Neutral
        }
    }

    /// Apply decay for the time elapsed since the previous call.
    ///
    /// Decay is incremental: calling this every minute gives the same result
    /// as calling it once after an hour.
    pub fn decay(&mut self, now: DateTime<Utc>) {
        let since = self.last_decay_at.unwrap_or(self.last_fed);
        let hours = hours_between(since, now);

        if hours > 0.0 {
            self.hunger = clamp_stat(self.hunger - hours * HUNGER_DECAY_PER_HOUR);
            self.energy = clamp_stat(self.energy + hours * ENERGY_RECOVERY_PER_HOUR);

            let lonely_from = self.last_interaction + chrono::Duration::seconds((LONELY_AFTER_HOURS * 3600.0) as i64);
            let lonely_start = if lonely_from > since { lonely_from } else { since };
            let lonely_hours = hours_between(lonely_start, now);
            if lonely_hours > 0.0 {
                self.happiness = clamp_stat(self.happiness - lonely_hours * HAPPINESS_DECAY_PER_HOUR);
            }

            self.last_decay_at = Some(now);
        }

        self.mood = self.derive_mood(now);
    }

    /// Reward from a completed task
    pub fn feed(&mut self, now: DateTime<Utc>) {
        self.decay(now);
        self.hunger = clamp_stat(self.hunger + 20.0);
        self.happiness = clamp_stat(self.happiness + 10.0);
        self.energy = clamp_stat(self.energy - 5.0);
        self.gain_xp(5);
        self.last_fed = now;
        self.last_interaction = now;
        self.mood = self.derive_mood(now);
    }

    /// Petting / playing
    pub fn interact(&mut self, now: DateTime<Utc>) {
        self.decay(now);
        self.happiness = clamp_stat(self.happiness + 15.0);
        self.energy = clamp_stat(self.energy - 10.0);
        self.gain_xp(2);
        self.last_interaction = now;
        self.mood = self.derive_mood(now);
    }

    fn gain_xp(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
        self.level = self.xp / 100 + 1;
    }

    /// One line of chatter matching mood and personality
    pub fn greeting(&self, now: DateTime<Utc>) -> String {
        match self.mood {
            Mood::Hungry => return format!("{} is hungry... finish a task to feed them!", self.name),
            Mood::Sleepy => return format!("{} is yawning. Maybe a short break?", self.name),
            Mood::Sad => return format!("{} missed you. Let's tidy something together?", self.name),
            _ => {}
        }

        let lines: &[&str] = match self.personality {
            Personality::Spunky => &[
                "Let's crush a quick win right now!",
                "I can feel a clean room coming!",
                "Go go go! One more task!",
            ],
            Personality::Calm => &[
                "One small thing at a time.",
                "Breathe in, pick one item, put it away.",
                "Progress, not perfection.",
            ],
            Personality::Wise => &[
                "If it takes under two minutes, do it now.",
                "Everything needs a home.",
                "Start with the surface you see first.",
            ],
            Personality::Silly => &[
                "Socks on the floor? Socks in the drawer! Tada!",
                "Race you to the laundry basket!",
                "Dust bunnies fear us.",
            ],
        };
        let idx = now.ordinal() as usize % lines.len();
        format!("{}: {}", self.name, lines[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_new_mascot_is_happy() {
        let mascot = Mascot::new("Dusty".to_string(), Personality::Calm, base_time());
        assert_eq!(mascot.mood, Mood::Happy);
        assert_eq!(mascot.level, 1);
    }

    #[test]
    fn test_hunger_decays_five_per_hour() {
        let t0 = base_time();
        let mut mascot = Mascot::new("Dusty".to_string(), Personality::Calm, t0);
        mascot.decay(t0 + Duration::hours(4));
        assert!((mascot.hunger - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_decay_does_not_compound() {
        let t0 = base_time();
        let mut stepped = Mascot::new("A".to_string(), Personality::Wise, t0);
        let mut once = stepped.clone();

        for minute in 1..=120 {
            stepped.decay(t0 + Duration::minutes(minute));
        }
        once.decay(t0 + Duration::minutes(120));

        assert!((stepped.hunger - once.hunger).abs() < 1e-6);
        assert!((stepped.energy - once.energy).abs() < 1e-6);
        assert!((stepped.hunger - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_stats_stay_clamped() {
        let t0 = base_time();
        let mut mascot = Mascot::new("Dusty".to_string(), Personality::Silly, t0);
        mascot.decay(t0 + Duration::days(10));
        assert_eq!(mascot.hunger, 0.0);
        assert_eq!(mascot.energy, 100.0);
        assert!(mascot.happiness >= 0.0);

        for _ in 0..20 {
            mascot.feed(t0 + Duration::days(10));
        }
        assert_eq!(mascot.hunger, 100.0);
        assert_eq!(mascot.happiness, 100.0);
    }

    #[test]
    fn test_hungry_takes_precedence() {
        let t0 = base_time();
        let mut mascot = Mascot::new("Dusty".to_string(), Personality::Spunky, t0);
        mascot.hunger = 10.0;
        mascot.happiness = 100.0;
        assert_eq!(mascot.derive_mood(t0), Mood::Hungry);

        mascot.hunger = 50.0;
        mascot.energy = 5.0;
        assert_eq!(mascot.derive_mood(t0), Mood::Sleepy);
    }

    #[test]
    fn test_neglect_makes_sad() {
        let t0 = base_time();
        let mut mascot = Mascot::new("Dusty".to_string(), Personality::Spunky, t0);
        mascot.hunger = 90.0;
        mascot.happiness = 95.0;
        assert_eq!(mascot.derive_mood(t0 + Duration::hours(1)), Mood::Ecstatic);
        assert_eq!(mascot.derive_mood(t0 + Duration::hours(25)), Mood::Sad);
    }

    #[test]
    fn test_happiness_holds_while_attended() {
        let t0 = base_time();
        let mut mascot = Mascot::new("Dusty".to_string(), Personality::Calm, t0);
        mascot.decay(t0 + Duration::hours(5));
        assert_eq!(mascot.happiness, 80.0);

        mascot.decay(t0 + Duration::hours(8));
        assert!((mascot.happiness - 76.0).abs() < 1e-9);
    }

    #[test]
    fn test_feed_rewards() {
        let t0 = base_time();
        let mut mascot = Mascot::new("Dusty".to_string(), Personality::Calm, t0);
        mascot.hunger = 30.0;
        mascot.feed(t0);
        assert_eq!(mascot.hunger, 50.0);
        assert_eq!(mascot.xp, 5);
        assert_eq!(mascot.last_fed, t0);
    }
}
