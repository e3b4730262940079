pub mod api;
pub mod models;
pub mod ownership;
pub mod query;
