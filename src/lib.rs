// ============================================================================
// CrowdConsole Library
// ============================================================================

pub mod core;
pub mod schema;
pub mod storage;
pub mod console;
pub mod connection;
pub mod server;

// Re-export main types for convenience
pub use core::{ConsoleError, EntityInstance, EntityKind, Fields, Result, StoreError};
pub use console::{ColumnSource, Console, EditState, Notice, NoticeLevel, SubmitOutcome};
pub use storage::{DocumentStore, HttpStore, MemoryStore};

// Re-export connection API
pub use connection::{
    open_store,
    auth::{AdminSession, AuthError, Authenticator},
    config::{ConfigError, ConsoleConfig, StoreLocation},
};
