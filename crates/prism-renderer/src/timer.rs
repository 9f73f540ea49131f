//! Frame timing checkpoints

use std::time::{Duration, Instant};

/// Six monotonic checkpoints recorded by every call to [`crate::Renderer::render`].
///
/// Overwritten each frame. A checkpoint of a stage that did not run keeps the
/// value of the previous checkpoint, so every span below is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerData {
    /// Entry of `render`.
    pub render_start: Instant,
    /// End of the object update stage.
    pub update_end: Instant,
    /// End of queue partitioning.
    pub feed_render_queues_end: Instant,
    /// End of picking and the main pass.
    pub main_render_end: Instant,
    /// End of post-processing and overlays.
    pub post_process_end: Instant,
    /// Exit of `render`.
    pub render_end: Instant,
}

impl TimerData {
    /// All checkpoints set to `now`.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            render_start: now,
            update_end: now,
            feed_render_queues_end: now,
            main_render_end: now,
            post_process_end: now,
            render_end: now,
        }
    }

    /// Whole frame.
    pub fn total(&self) -> Duration {
        self.render_end.duration_since(self.render_start)
    }

    /// Object updates.
    pub fn update(&self) -> Duration {
        self.update_end.duration_since(self.render_start)
    }

    /// Queue partitioning.
    pub fn feed_render_queues(&self) -> Duration {
        self.feed_render_queues_end
            .duration_since(self.update_end)
    }

    /// Picking and the main pass.
    pub fn main_render(&self) -> Duration {
        self.main_render_end
            .duration_since(self.feed_render_queues_end)
    }

    /// Post-processing and overlays.
    pub fn post_process(&self) -> Duration {
        self.post_process_end.duration_since(self.main_render_end)
    }

    /// Composite.
    pub fn composite(&self) -> Duration {
        self.render_end.duration_since(self.post_process_end)
    }

    /// True when the checkpoints are in order.
    pub fn is_monotonic(&self) -> bool {
        self.render_start <= self.update_end
            && self.update_end <= self.feed_render_queues_end
            && self.feed_render_queues_end <= self.main_render_end
            && self.main_render_end <= self.post_process_end
            && self.post_process_end <= self.render_end
    }
}

impl Default for TimerData {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}
