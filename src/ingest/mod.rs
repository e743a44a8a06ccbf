// src/ingest/mod.rs
pub mod directory;
pub mod orchestrator;

pub use directory::DirectorySync;
pub use orchestrator::Ingestor;
