pub mod attempts;
pub mod health;
pub mod questions;
pub mod users;
