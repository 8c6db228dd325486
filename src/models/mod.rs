pub mod answer_component;
pub mod attempt;
pub mod question;
pub mod quiz;
pub mod user;
pub mod user_item;
