pub mod aggregator;
pub mod config;
pub mod detector;
pub mod scorer;
pub mod session;
pub mod tracker;
pub mod types;
pub mod window;
