pub mod collection;
pub mod error;
pub mod focus;
pub mod mascot;
pub mod profile;
pub mod room;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod store;

pub use collection::{CollectedItem, Collectible, CollectionStats, SpawnEvent, COLLECTIBLES};
pub use error::{Result, StoreError};
pub use focus::{FocusSession, FocusSummary};
pub use mascot::{Mascot, Mood, Personality};
pub use profile::UserProfile;
pub use room::{CleaningTask, NewRoom, NewTask, PhotoType, Room, RoomType, RoomUpdate};
pub use settings::AppSettings;
pub use stats::{Badge, UserStats};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{AppState, Store, ToggleOutcome};
