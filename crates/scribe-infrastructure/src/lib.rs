pub mod config_service;
pub mod dir_session_repository;
pub mod file_source;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::dir_session_repository::DirSessionRepository;
pub use crate::file_source::load_file_source;
pub use crate::paths::ScribePaths;
