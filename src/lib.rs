pub mod app_config;
pub mod export;
pub mod report;
pub mod session;
pub mod store;
pub mod validation;
pub mod web;
