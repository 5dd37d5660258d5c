use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "declutter")]
#[command(about = "Decluttering coach: rooms, bite-sized tasks, AI photo plans and a mascot that cheers you on")]
#[command(version)]
pub struct Args {
    /// Data directory (defaults to <config dir>/declutter)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set your name and finish first-run setup
    Onboard {
        name: String,
    },
    /// Show or rename your profile
    Profile {
        #[arg(long)]
        name: Option<String>,
    },
    /// Manage rooms
    Room {
        #[command(subcommand)]
        command: RoomCommands,
    },
    /// Manage tasks inside a room
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Tick off the smaller steps of a task
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommands,
    },
    /// XP, level, streak and counters
    Stats,
    /// Every badge with your progress toward it
    Badges,
    /// Your cleaning companion
    Mascot {
        #[command(subcommand)]
        command: MascotCommands,
    },
    /// Run a focus timer (Ctrl-C ends it early)
    Focus {
        /// Minutes; defaults to the focus duration in settings
        minutes: Option<u32>,
        /// Room this session is for
        #[arg(long)]
        room: Option<String>,
    },
    /// Collectibles you have found
    Collection,
    /// App preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Gemini API key used for photo analysis
    Apikey {
        #[command(subcommand)]
        command: ApiKeyCommands,
    },
    /// A line of encouragement
    Motivate {
        /// What you are working on
        #[arg(long)]
        context: Option<String>,
    },
    /// Delete all data and start over
    Reset {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum RoomCommands {
    /// Add a room
    Add {
        name: String,
        /// bedroom, kitchen, bathroom, living-room, office, garage, closet, other
        #[arg(long = "type", default_value = "other")]
        room_type: String,
        #[arg(long)]
        emoji: Option<String>,
    },
    /// List rooms with progress
    List,
    /// Show a room and its tasks
    Show {
        room: String,
    },
    /// Delete a room
    Delete {
        room: String,
    },
    /// Attach a photo to a room
    Photo {
        room: String,
        path: PathBuf,
        /// before, progress or after
        #[arg(long, default_value = "before")]
        kind: String,
    },
    /// Analyze a photo and add the suggested tasks
    Analyze {
        room: String,
        photo: PathBuf,
        /// Anything the AI should know
        #[arg(long)]
        notes: Option<String>,
        /// How many minutes you have right now
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Compare a before and an after photo
    Compare {
        room: String,
        before: PathBuf,
        after: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task by hand
    Add {
        room: String,
        title: String,
        #[arg(long, default_value_t = 5)]
        minutes: u32,
        /// high, medium or low
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Repeat for several steps
        #[arg(long = "step")]
        steps: Vec<String>,
    },
    /// Complete (or un-complete) a task
    Toggle {
        room: String,
        /// Task number, id prefix or title
        task: String,
    },
    /// Remove a task
    Delete {
        room: String,
        task: String,
    },
    /// Tasks of two minutes or less
    QuickWins {
        room: String,
    },
}

#[derive(Subcommand)]
pub enum SubtaskCommands {
    Toggle {
        room: String,
        task: String,
        /// Step number or id prefix
        subtask: String,
    },
}

#[derive(Subcommand)]
pub enum MascotCommands {
    /// Adopt a mascot
    Adopt {
        name: String,
        /// spunky, calm, wise or silly
        #[arg(long, default_value = "spunky")]
        personality: String,
    },
    Status,
    Feed,
    /// Play with your mascot
    Pet,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    Show,
    /// Change one setting
    Set {
        /// theme, encouragement, notifications, haptics, focus-duration,
        /// strict-mode, break-reminders, collection, spawn-on-complete, spawn-notifications
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ApiKeyCommands {
    Set {
        key: String,
    },
    Clear,
}
