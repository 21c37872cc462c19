//! # Server Tick Loop
//!
//! Fixed-timestep driver for a [`ServerRoom`].
//!
//! ## Design
//!
//! The room never schedules itself. Something outside must call
//! `server_tick` at a steady rate; this loop is that something for hosts
//! that do not bring their own scheduler:
//! - Wall time accumulates, and every whole tick owed is run
//! - State records are stored every `store_interval` ticks
//! - Per-tick wall time feeds [`TickStats`]

use std::time::{Duration, Instant};

use crate::config::RoomConfig;

use super::registry::EntityRegistry;
use super::room::ServerRoom;

/// Fixed-timestep tick loop controller.
///
/// Ensures consistent tick rate regardless of processing time.
pub struct TickLoop {
    /// Target tick duration.
    tick_duration: Duration,
    /// Time of last accumulation.
    last_tick: Instant,
    /// Time owed to the simulation.
    accumulator: Duration,
    /// Total ticks executed.
    tick_count: u64,
    /// Ticks between `store_states` calls, zero for never.
    store_interval: u32,
    /// Frame time statistics.
    stats: TickStats,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Number of late ticks (took longer than budget).
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn fresh(budget: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: duration_us(budget),
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_us(duration: Duration) -> u64 {
    duration.as_micros() as u64
}

impl TickLoop {
    /// Creates a tick loop at `tick_rate` Hz, storing states every tick.
    ///
    /// A rate of zero is treated as 1 Hz.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));

        Self {
            tick_duration,
            last_tick: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            store_interval: 1,
            stats: TickStats::fresh(tick_duration),
        }
    }

    /// Creates a tick loop from a room's configuration.
    #[must_use]
    pub fn from_config(config: &RoomConfig) -> Self {
        Self {
            store_interval: config.store_interval,
            ..Self::new(config.tick_rate)
        }
    }

    /// Returns true if it's time to execute a tick.
    ///
    /// Call this in a loop until it returns false.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_tick);
        self.last_tick = now;

        self.accumulator >= self.tick_duration
    }

    /// Marks the start of a tick.
    ///
    /// Returns the tick start time for duration measurement.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.tick_duration);
        self.tick_count += 1;
        Instant::now()
    }

    /// Marks the end of a tick.
    ///
    /// Records statistics about tick duration.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        let duration_us = duration_us(duration);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);

        // Rolling average
        self.stats.avg_tick_us = (self.stats.avg_tick_us * 15 + duration_us) / 16;

        if duration > self.tick_duration {
            self.stats.late_ticks += 1;
        }
    }

    /// Runs every tick currently owed to `room`. Returns how many ran.
    pub fn run_pending<R: EntityRegistry>(&mut self, room: &mut ServerRoom<R>) -> u32 {
        let mut ran = 0;
        while self.should_tick() {
            let start = self.begin_tick();
            room.server_tick();
            if self.store_interval != 0 && self.tick_count % u64::from(self.store_interval) == 0 {
                room.store_states();
            }
            self.end_tick(start);
            ran += 1;
        }
        ran
    }

    /// Waits until the next tick is due.
    ///
    /// Uses spin-wait for the final microseconds to ensure accuracy.
    pub fn wait_for_next_tick(&self) {
        let elapsed = self.accumulator + self.last_tick.elapsed();

        if elapsed < self.tick_duration {
            let remaining = self.tick_duration - elapsed;

            if remaining > Duration::from_micros(1000) {
                std::thread::sleep(remaining - Duration::from_micros(500));
            }

            while self.accumulator + self.last_tick.elapsed() < self.tick_duration {
                std::hint::spin_loop();
            }
        }
    }

    /// Returns the total ticks this loop has started.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns tick statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Returns the target tick duration.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.tick_duration);
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::from_config(&RoomConfig::default())
    }
}
