pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    attempt_service::AttemptService, quiz_service::QuizService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub quiz_service: QuizService,
    pub attempt_service: AttemptService,
    pub user_service: UserService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let quiz_service = QuizService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let user_service = UserService::new(pool.clone());

        Self {
            pool,
            quiz_service,
            attempt_service,
            user_service,
        }
    }
}
