pub mod config;
pub mod error;
pub mod meter;
pub mod parking;
pub mod report;
pub mod sensor;
pub mod state;
mod tick;
