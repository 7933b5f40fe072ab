pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    candidate_service::CandidateService, history_service::HistoryService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub candidate_service: CandidateService,
    pub history_service: HistoryService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let candidate_service = CandidateService::new(pool.clone());
        let history_service = HistoryService::new(pool.clone());

        Self {
            pool,
            candidate_service,
            history_service,
        }
    }
}
