//! Gaze-signal processing and adaptive-decision engine.
//!
//! Turns a raw stream of gaze samples into ocular events (fixations,
//! saccades, blinks), aggregates them into fixed 10-second feature windows,
//! forwards each window to an external emotion classifier, and decides when
//! to interrupt a reading session with an adaptive intervention.

pub mod config;
pub mod engine;
pub mod logging;
pub mod services;
