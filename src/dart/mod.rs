// src/dart/mod.rs
pub mod archive;
pub mod client;
pub mod models;

pub use client::DartClient;
pub use models::{CorpCodeRecord, DisclosureListEntry, ListQuery};
