//! Scroll progress coalescing.
//!
//! At most one `did-scroll` per animation frame. The value reported is the
//! one sampled when the frame was scheduled; later samples in the same frame
//! are dropped.

/// Tracks scroll samples from the active surface.
#[derive(Debug, Default, Clone)]
pub struct ScrollStateTracker {
    scheduled: Option<f64>,
}

impl ScrollStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a scroll sample. Returns `true` if this sample scheduled a frame.
    pub fn on_scroll(&mut self, scroll_top: f64, client_height: f64) -> bool {
        if self.scheduled.is_some() {
            return false;
        }
        let progress = scroll_top / client_height;
        if !progress.is_finite() {
            return false;
        }
        self.scheduled = Some(progress);
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    /// The frame fired: take the scheduled progress, if any.
    pub fn on_animation_frame(&mut self) -> Option<f64> {
        self.scheduled.take()
    }

    /// Forget any scheduled notification (the surface went away).
    pub fn reset(&mut self) {
        self.scheduled = None;
    }
}
