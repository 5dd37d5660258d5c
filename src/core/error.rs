use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Sub-task not found: {0}")]
    SubTaskNotFound(String),

    #[error("No mascot adopted yet")]
    NoMascot,

    #[error("No focus session is running")]
    NoFocusSession,

    #[error("A focus session is already running")]
    FocusSessionActive,

    #[error("Spawn not found: {0}")]
    SpawnNotFound(String),

    #[error("Spawn expired: {0}")]
    SpawnExpired(String),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
