//! Public library modules for the CLI crate
pub mod db;
pub mod extract;
pub mod output;
