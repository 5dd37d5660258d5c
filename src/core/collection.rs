use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a spawn stays on screen before it disappears
pub const SPAWN_LIFETIME_SECS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn emoji(&self) -> &'static str {
        match self {
            Rarity::Common => "⚪",
            Rarity::Uncommon => "🟢",
            Rarity::Rare => "🔵",
            Rarity::Epic => "🟣",
            Rarity::Legendary => "🟡",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Uncommon => "UNCOMMON",
            Rarity::Rare => "RARE",
            Rarity::Epic => "EPIC",
            Rarity::Legendary => "LEGENDARY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Sparkles,
    Tools,
    Creatures,
    Treasures,
    /// Milestone rewards; never rolled
    Special,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collectible {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub category: Category,
    pub spawn_chance: f64,
    pub xp_value: u32,
    pub required_tasks: u32,
}

macro_rules! collectible {
    ($id:expr, $name:expr, $emoji:expr, $desc:expr, $rarity:ident, $cat:ident, $chance:expr, $xp:expr, $req:expr) => {
        Collectible {
            id: $id,
            name: $name,
            emoji: $emoji,
            description: $desc,
            rarity: Rarity::$rarity,
            category: Category::$cat,
            spawn_chance: $chance,
            xp_value: $xp,
            required_tasks: $req,
        }
    };
}

pub static COLLECTIBLES: &[Collectible] = &[
    collectible!("sparkle-star", "Sparkle Star", "⭐", "A tiny star left behind by a clean surface", Common, Sparkles, 0.12, 5, 0),
    collectible!("shine-drop", "Shine Drop", "💧", "Polished to perfection", Common, Sparkles, 0.10, 5, 0),
    collectible!("fresh-breeze", "Fresh Breeze", "🍃", "The smell of an aired-out room", Common, Sparkles, 0.08, 5, 0),
    collectible!("rainbow-glint", "Rainbow Glint", "🌈", "Light dancing on a clear shelf", Uncommon, Sparkles, 0.06, 15, 5),
    collectible!("golden-sparkle", "Golden Sparkle", "✨", "Only appears after serious effort", Rare, Sparkles, 0.03, 30, 15),
    collectible!("tiny-broom", "Tiny Broom", "🧹", "Sweeps away the small stuff", Common, Tools, 0.08, 5, 0),
    collectible!("magic-sponge", "Magic Sponge", "🧽", "Absorbs chaos", Common, Tools, 0.06, 5, 0),
    collectible!("label-maker", "Label Maker", "🏷️", "Everything gets a name and a home", Uncommon, Tools, 0.05, 15, 5),
    collectible!("storage-box", "Storage Box", "📦", "A place for everything", Uncommon, Tools, 0.05, 15, 10),
    collectible!("golden-vacuum", "Golden Vacuum", "🌀", "Legendary suction power", Epic, Tools, 0.015, 50, 25),
    collectible!("dust-bunny", "Dust Bunny", "🐰", "Caught hiding under the bed", Common, Creatures, 0.06, 5, 0),
    collectible!("sock-monster", "Sock Monster", "🧦", "Finally reunited with its pair", Uncommon, Creatures, 0.04, 15, 3),
    collectible!("tidy-fox", "Tidy Fox", "🦊", "Clever and organised", Rare, Creatures, 0.025, 30, 10),
    collectible!("clean-dragon", "Clean Dragon", "🐉", "Breathes fresh air instead of fire", Epic, Creatures, 0.01, 50, 30),
    collectible!("lost-coin", "Lost Coin", "🪙", "Found between the sofa cushions", Common, Treasures, 0.05, 5, 0),
    collectible!("forgotten-photo", "Forgotten Photo", "🖼️", "A memory rediscovered", Uncommon, Treasures, 0.04, 15, 5),
    collectible!("crystal-gem", "Crystal Gem", "💎", "Clarity made solid", Rare, Treasures, 0.02, 30, 20),
    collectible!("ancient-key", "Ancient Key", "🗝️", "Unlocks the tidiest of drawers", Legendary, Treasures, 0.005, 100, 50),
    collectible!("first-room-trophy", "First Room Trophy", "🏆", "Awarded for finishing a whole room", Legendary, Special, 0.0, 100, 0),
    collectible!("streak-crown", "Streak Crown", "👑", "Awarded for a 7-day streak", Legendary, Special, 0.0, 100, 0),
];

pub fn find_collectible(id: &str) -> Option<&'static Collectible> {
    COLLECTIBLES.iter().find(|c| c.id == id)
}

/// Weighted roll over the catalog.
///
/// Walks the eligible entries (not special, `required_tasks` met, nonzero
/// chance) accumulating spawn chances and returns the first one whose running
/// total exceeds `draw`. `draw` is a uniform sample in `[0, 1)`; when it lands
/// past the total chance nothing spawns.
pub fn spawn_collectible(draw: f64, completed_tasks: u32) -> Option<&'static Collectible> {
    let mut cumulative = 0.0;
    for item in COLLECTIBLES.iter().filter(|c| {
        c.category != Category::Special && c.required_tasks <= completed_tasks && c.spawn_chance > 0.0
    }) {
        cumulative += item.spawn_chance;
        if draw < cumulative {
            return Some(item);
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A collectible currently on screen, waiting to be tapped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEvent {
    pub id: String,
    pub collectible_id: String,
    pub position: Position,
    pub spawned_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub collected: bool,
    pub room_id: Option<String>,
    pub task_id: Option<String>,
}

impl SpawnEvent {
    pub fn new(
        collectible: &Collectible,
        position: Position,
        room_id: Option<String>,
        task_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        SpawnEvent {
            id: Uuid::new_v4().to_string(),
            collectible_id: collectible.id.to_string(),
            position,
            spawned_at: now,
            expires_at: now + Duration::seconds(SPAWN_LIFETIME_SECS),
            collected: false,
            room_id,
            task_id,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedItem {
    pub id: String,
    pub collectible_id: String,
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionStats {
    pub total_collected: u32,
    pub unique_collected: u32,
    pub collectibles_xp: u32,
    pub common_count: u32,
    pub uncommon_count: u32,
    pub rare_count: u32,
    pub epic_count: u32,
    pub legendary_count: u32,
    pub last_collected_at: Option<DateTime<Utc>>,
}

impl CollectionStats {
    /// Update counters for an item just appended to `collection`
    pub fn record(&mut self, item: &Collectible, collection: &[CollectedItem], now: DateTime<Utc>) {
        self.total_collected += 1;
        self.collectibles_xp += item.xp_value;
        match item.rarity {
            Rarity::Common => self.common_count += 1,
            Rarity::Uncommon => self.uncommon_count += 1,
            Rarity::Rare => self.rare_count += 1,
            Rarity::Epic => self.epic_count += 1,
            Rarity::Legendary => self.legendary_count += 1,
        }
        let mut ids: Vec<&str> = collection.iter().map(|c| c.collectible_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        self.unique_collected = ids.len() as u32;
        self.last_collected_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        assert_eq!(COLLECTIBLES.len(), 20);
        for item in COLLECTIBLES {
            if item.category == Category::Special {
                assert_eq!(item.spawn_chance, 0.0);
            }
            assert!(item.spawn_chance >= 0.0 && item.spawn_chance <= 1.0);
        }
        let total: f64 = COLLECTIBLES.iter().map(|c| c.spawn_chance).sum();
        assert!(total < 1.0);
    }

    #[test]
    fn test_low_draw_hits_first_eligible() {
        let item = spawn_collectible(0.0, 0).unwrap();
        assert_eq!(item.id, "sparkle-star");

        let item = spawn_collectible(0.15, 0).unwrap();
        assert_eq!(item.id, "shine-drop");
    }

    #[test]
    fn test_high_draw_spawns_nothing() {
        assert!(spawn_collectible(0.999, 0).is_none());
        assert!(spawn_collectible(0.999, 1000).is_none());
    }

    #[test]
    fn test_roll_respects_requirements() {
        for completed in [0u32, 3, 10, 49, 100] {
            let mut draw = 0.0;
            while draw < 1.0 {
                if let Some(item) = spawn_collectible(draw, completed) {
                    assert!(item.required_tasks <= completed);
                    assert_ne!(item.category, Category::Special);
                }
                draw += 0.001;
            }
        }
    }

    #[test]
    fn test_spawn_expiry() {
        let now = Utc::now();
        let item = find_collectible("dust-bunny").unwrap();
        let spawn = SpawnEvent::new(item, Position { x: 0.5, y: 0.5 }, None, None, now);

        assert!(!spawn.is_expired(now + Duration::seconds(29)));
        assert!(spawn.is_expired(now + Duration::seconds(30)));
    }

    #[test]
    fn test_stats_record_unique() {
        let now = Utc::now();
        let bunny = find_collectible("dust-bunny").unwrap();
        let mut collection = Vec::new();
        let mut stats = CollectionStats::default();

        for _ in 0..2 {
            collection.push(CollectedItem {
                id: Uuid::new_v4().to_string(),
                collectible_id: bunny.id.to_string(),
                collected_at: now,
                room_id: None,
                task_id: None,
            });
            stats.record(bunny, &collection, now);
        }

        assert_eq!(stats.total_collected, 2);
        assert_eq!(stats.unique_collected, 1);
        assert_eq!(stats.common_count, 2);
        assert_eq!(stats.collectibles_xp, 10);
    }
}
