pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod middleware;
pub mod services;
