pub mod config;
pub mod error;
pub mod progress;
pub mod stage;
pub mod tool;
