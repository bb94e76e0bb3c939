//! Gaze tracker boundary.
//!
//! The engine drives the tracker's lifecycle but treats it as an opaque
//! capability set; camera acquisition and (x, y) estimation live elsewhere.

pub trait GazeTracker {
    fn begin(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn end(&mut self);
}

/// Tracker stand-in for replay runs and tests, where samples arrive from a
/// file or a script rather than a live camera.
#[derive(Debug, Default)]
pub struct NoopTracker;

impl GazeTracker for NoopTracker {
    fn begin(&mut self) {
        tracing::debug!("tracker begin");
    }

    fn pause(&mut self) {
        tracing::debug!("tracker pause");
    }

    fn resume(&mut self) {
        tracing::debug!("tracker resume");
    }

    fn end(&mut self) {
        tracing::debug!("tracker end");
    }
}
