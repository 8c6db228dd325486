pub mod attempt_service;
pub mod quiz_service;
pub mod srs_service;
pub mod user_service;
