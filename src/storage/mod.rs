pub mod engine;
pub mod http;
pub mod memory;
pub mod persistence;

pub use engine::DocumentStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use persistence::SnapshotFile;
