pub mod cli;
pub mod config;
pub mod import;
pub mod store;
pub mod ui;
