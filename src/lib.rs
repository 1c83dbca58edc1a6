pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod prepare;
pub mod schema;
pub mod stats;
pub mod types;
