pub mod api;
pub mod cascade;
pub mod config;
pub mod filters;
pub mod form;
pub mod list;
pub mod models;
pub mod reference;
pub mod references;
pub mod render;
pub mod types;
