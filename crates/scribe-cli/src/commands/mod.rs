pub mod assistant;
pub mod config;
pub mod format;
pub mod replay;
pub mod sessions;
pub mod sources;
