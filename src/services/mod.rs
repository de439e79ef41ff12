/// Board authoring, play, and persistence operations.
pub mod board_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Storage connection supervisor with degraded-mode handling.
pub mod storage_supervisor;
