pub mod error;
pub mod types;
pub mod value;

pub use error::{ConsoleError, Result, StoreError, StoreResult};
pub use types::{EntityInstance, EntityKind, Fields, ID_FIELD};
