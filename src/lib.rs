//! Films catalog browser and admin uploader backed by Firebase.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod models;
pub mod shell;
pub mod store;
pub mod view;

#[cfg(test)]
mod testing;

pub use app::App;
pub use error::CatalogError;
