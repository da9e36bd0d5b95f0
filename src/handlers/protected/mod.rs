pub mod admin;
pub mod auth;
pub mod organizational;
pub mod tickets;
