pub mod app_data;
pub mod config;
pub mod quiz;
