pub mod doc_server;

pub use doc_server::{router, serve};
