pub mod app;
pub mod config;
pub mod explorer;
pub mod file_tree;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod monitor;
pub mod notifications;
pub mod preferences;
pub mod projects;
pub mod terminal;
