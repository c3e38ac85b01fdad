pub mod config;
pub mod configs;
mod connection;
pub mod limiter;
pub mod processor;
mod protocol;
pub mod server;
pub mod store;
pub mod validate;
