pub mod chains;
pub mod config;
pub mod error;
pub mod hub;
pub mod models;
pub mod telemetry;
pub mod vote;
pub mod wallet;
pub mod widget;

#[cfg(test)]
mod testing;
