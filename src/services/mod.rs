pub mod candidate_service;
pub mod export_service;
pub mod history_service;
