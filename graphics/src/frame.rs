//! Per-frame statistics and timing.

use std::time::{Duration, Instant};

/// Immutable snapshot of one frame's statistics.
///
/// "Total" counters include every instance in every traversed bin;
/// "drawn" counters include only the instances that passed visibility
/// classification and reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Frames per second, averaged over the clock window.
    pub fps: f32,
    /// Vertices submitted to the backend this frame.
    pub vertex_drawn: u64,
    /// Vertices across all traversed instances.
    pub vertex_total: u64,
    /// Primitives submitted to the backend this frame.
    pub primitive_drawn: u64,
    /// Primitives across all traversed instances.
    pub primitive_total: u64,
    /// Instances submitted to the backend this frame.
    pub instance_drawn: u64,
    /// Instances across all traversed bins.
    pub instance_total: u64,
}

impl FrameStats {
    /// Zero the per-frame counters; the fps field is owned by the clock.
    pub(crate) fn reset_counters(&mut self) {
        self.vertex_drawn = 0;
        self.vertex_total = 0;
        self.primitive_drawn = 0;
        self.primitive_total = 0;
        self.instance_drawn = 0;
        self.instance_total = 0;
    }
}

/// Wall-clock frame timing: delta time, windowed FPS, and the wrapped
/// `[0, 1)` time value backing the reserved time uniform placeholder.
///
/// The clock ticks unconditionally every frame, even while the context
/// is lost.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    window: Duration,
    window_start: Option<Instant>,
    window_frames: u32,
    fps: f32,
    delta: f32,
    time: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock with the default half-second FPS window.
    pub fn new() -> Self {
        Self {
            last: None,
            window: Duration::from_millis(500),
            window_start: None,
            window_frames: 0,
            fps: 0.0,
            delta: 0.0,
            time: 0.0,
        }
    }

    /// Change the FPS averaging window.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Advance the clock to `now`.
    pub fn tick(&mut self, now: Instant) {
        self.delta = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);

        self.time = (self.time + self.delta).fract();

        let window_start = *self.window_start.get_or_insert(now);
        self.window_frames += 1;
        let elapsed = now.saturating_duration_since(window_start);
        if elapsed >= self.window {
            self.fps = self.window_frames as f32 / elapsed.as_secs_f32();
            self.window_start = Some(now);
            self.window_frames = 0;
        }
    }

    /// Frames per second over the last completed window.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Previous frame's delta time in seconds.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Wrapped elapsed time in `[0, 1)`.
    pub fn time(&self) -> f32 {
        self.time
    }
}
