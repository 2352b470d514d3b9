pub mod app;
pub mod config;
pub mod managers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;
