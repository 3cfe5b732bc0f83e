pub mod aggregate;
pub mod api;
pub mod commands;
pub mod db;
pub mod filter;
pub mod models;
pub mod report;
pub mod session;
pub mod store;
