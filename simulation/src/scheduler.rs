//! Global tick counter deciding which passes run on each tick.

/// Passes scheduled for a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickPhase {
    /// Index of the tick, starting at one.
    pub tick: u64,
    /// Whether agents may consume a path step on this tick.
    pub movement: bool,
}

/// Drives the tick counter; planning runs every tick, movement every Nth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickScheduler {
    tick: u64,
    movement_interval: u64,
}

impl TickScheduler {
    /// Creates a scheduler that moves agents every `movement_interval` ticks.
    ///
    /// Returns `None` for a zero interval.
    #[must_use]
    pub fn new(movement_interval: u64) -> Option<Self> {
        (movement_interval > 0).then_some(Self {
            tick: 0,
            movement_interval,
        })
    }

    /// Advances the counter and reports which passes run on the new tick.
    pub fn advance(&mut self) -> TickPhase {
        self.tick = self.tick.saturating_add(1);
        TickPhase {
            tick: self.tick,
            movement: self.is_movement_tick(self.tick),
        }
    }

    /// Index of the last completed tick; zero before the first advance.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the provided tick carries a movement pass.
    #[must_use]
    pub const fn is_movement_tick(&self, tick: u64) -> bool {
        tick % self.movement_interval == 0
    }
}
