mod database;
mod redis;
mod state_builder;

pub use database::connect_database;
pub use state_builder::build_app_state;
