pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod stream;
pub mod ui;
