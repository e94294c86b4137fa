pub mod dto;
pub mod log_repository;
pub mod paths;
pub mod profile_repository;
pub mod secret_service;

pub use crate::log_repository::JsonLogRepository;
pub use crate::paths::FitfeastPaths;
pub use crate::profile_repository::JsonProfileRepository;
pub use crate::secret_service::SecretServiceImpl;
