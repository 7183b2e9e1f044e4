pub mod app;
pub mod auth;
pub mod config;
pub mod shelf;
pub mod state;
