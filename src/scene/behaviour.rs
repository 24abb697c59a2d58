use std::time::{Duration, Instant};

use crate::error::Result;

use super::{NodeIdx, SceneGraph};

/// Per-node logic driven by [`SceneGraph::update`].
pub trait NodeBehaviour: Send {
    /// Called once, right before the first update of the node.
    fn setup(&mut self, _scene: &mut SceneGraph, _node: NodeIdx, _timer: &Timer) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, scene: &mut SceneGraph, node: NodeIdx, timer: &Timer) -> Result<()>;
}

impl<F> NodeBehaviour for F
where
    F: FnMut(&mut SceneGraph, NodeIdx, &Timer) -> Result<()> + Send,
{
    fn update(&mut self, scene: &mut SceneGraph, node: NodeIdx, timer: &Timer) -> Result<()> {
        self(scene, node, timer)
    }
}

/// Time keeping of the update loop.
#[derive(Copy, Clone, Debug)]
pub struct Timer {
    start: Instant,
    current: Instant,
    delta: Duration,
    frame: u64,
}

impl Timer {
    pub fn new() -> Timer {
        Timer::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Timer {
        Timer {
            start,
            current: start,
            delta: Duration::ZERO,
            frame: 0,
        }
    }

    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Advances the timer to `now`. Instants earlier than the last update count as no time passing.
    pub fn update_at(&mut self, now: Instant) {
        let now = now.max(self.current);
        self.delta = now - self.current;
        self.current = now;
        self.frame += 1;
    }

    /// Time since the timer was started, as of the last update.
    pub fn elapsed(&self) -> Duration {
        self.current - self.start
    }

    /// Time between the last two updates.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Number of updates so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}
