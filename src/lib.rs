pub mod api;
pub mod config;
pub mod ingest;
pub mod models;
pub mod status_store;
pub mod sweeper;
