//! Frame clock: display-refresh timestamps to per-frame delta-time

/// Converts frame-callback timestamps into clamped deltas
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Option<f64>,
    max_delta_ms: f32,
}

impl FrameClock {
    pub fn new(max_delta_ms: f32) -> Self {
        Self {
            last: None,
            max_delta_ms,
        }
    }

    /// Delta since the previous timestamp in ms.
    ///
    /// The first tick yields 0. Backwards timestamps yield 0 and long stalls
    /// (tab switches, debugger pauses) are clamped to `max_delta_ms`.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        let dt = match self.last {
            Some(last) => (timestamp_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last = Some(timestamp_ms.max(self.last.unwrap_or(f64::MIN)));
        dt.min(self.max_delta_ms)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(crate::consts::MAX_FRAME_MS)
    }
}
