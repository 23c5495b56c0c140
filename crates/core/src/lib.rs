//! Core library: class extraction, field walking, filtering, scanning and persistence.

pub mod blocks;
pub mod config;
pub mod extractor;
pub mod filter;
pub mod models;
pub mod persister;
pub mod pipeline;
pub mod scanner;
pub mod source;
pub mod walker;
