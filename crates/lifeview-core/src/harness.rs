#![forbid(unsafe_code)]

//! Virtual-time host for driving a [`Viewer`] without a browser.
//!
//! [`SimulatedHost`] plays the part of the page event loop: it owns a
//! [`DeterministicClock`], a queue of one-shot timers armed by
//! [`TickCommand::Schedule`], and a log of outbound tick pushes. Timers fire in
//! due-time order, optionally late, which is how jitter and slow frames are
//! reproduced in tests.
//!
//! ```
//! use core::time::Duration;
//! use lifeview_core::config::ViewerConfig;
//! use lifeview_core::harness::SimulatedHost;
//! use lifeview_core::surface::RasterSurface;
//! use lifeview_core::viewer::Viewer;
//! use lifeview_core::viewport::WindowMetrics;
//!
//! let viewer = Viewer::new(
//!     RasterSurface::new(1, 1),
//!     WindowMetrics::new(320.0, 240.0, Some(1.0)),
//!     ViewerConfig::default(),
//! )
//! .unwrap();
//! let mut host = SimulatedHost::new(viewer);
//! host.connect_and_join(r#"{"positions":[]}"#).unwrap();
//! host.keypress();
//! host.run_until(Duration::from_millis(350));
//! assert_eq!(host.pushes().len(), 3);
//! ```

use core::cmp::Reverse;
use core::time::Duration;
use std::collections::{BTreeSet, BinaryHeap};

use crate::clock::{DeterministicClock, MonotonicClock};
use crate::error::Result;
use crate::render::FrameStats;
use crate::surface::Surface;
use crate::tick::{ChainId, TickCommand};
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PendingTimer {
    due: Duration,
    seq: u64,
    chain: ChainId,
}

/// A timer that has fired, as observed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub chain: ChainId,
    pub due: Duration,
    pub fired_at: Duration,
    /// Whether the firing pushed a tick.
    pub pushed: bool,
}

pub struct SimulatedHost<S: Surface> {
    viewer: Viewer<S>,
    clock: DeterministicClock,
    timers: BinaryHeap<Reverse<PendingTimer>>,
    next_seq: u64,
    pushes: Vec<Duration>,
    scheduled: Vec<Duration>,
    max_pending_chains: usize,
}

impl<S: Surface> SimulatedHost<S> {
    #[must_use]
    pub fn new(viewer: Viewer<S>) -> Self {
        Self {
            viewer,
            clock: DeterministicClock::new(),
            timers: BinaryHeap::new(),
            next_seq: 0,
            pushes: Vec::new(),
            scheduled: Vec::new(),
            max_pending_chains: 0,
        }
    }

    #[must_use]
    pub const fn viewer(&self) -> &Viewer<S> {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer<S> {
        &mut self.viewer
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now_mono()
    }

    /// Move the clock forward without firing anything (a busy main thread).
    pub fn stall(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Instants at which a tick was pushed on the channel.
    #[must_use]
    pub fn pushes(&self) -> &[Duration] {
        &self.pushes
    }

    /// Every delay handed to a one-shot timer, in order.
    #[must_use]
    pub fn scheduled_delays(&self) -> &[Duration] {
        &self.scheduled
    }

    /// Distinct chains with an armed timer right now.
    #[must_use]
    pub fn pending_chains(&self) -> usize {
        self.timers
            .iter()
            .map(|Reverse(t)| t.chain)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Highest [`Self::pending_chains`] ever observed.
    #[must_use]
    pub const fn max_pending_chains(&self) -> usize {
        self.max_pending_chains
    }

    /// Due time of the next armed timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.peek().map(|Reverse(t)| t.due)
    }

    fn execute(&mut self, commands: Vec<TickCommand>) -> bool {
        let mut pushed = false;
        for command in commands {
            match command {
                TickCommand::PushTick => {
                    self.pushes.push(self.now());
                    pushed = true;
                }
                TickCommand::Schedule { chain, delay } => {
                    self.scheduled.push(delay);
                    self.timers.push(Reverse(PendingTimer {
                        due: self.now().saturating_add(delay),
                        seq: self.next_seq,
                        chain,
                    }));
                    self.next_seq += 1;
                }
            }
        }
        self.max_pending_chains = self.max_pending_chains.max(self.pending_chains());
        pushed
    }

    /// Connect and immediately acknowledge the join with `payload`.
    pub fn connect_and_join(&mut self, payload: &str) -> Result<Option<FrameStats>> {
        self.viewer.connect()?;
        let now = self.now();
        let outcome = self.viewer.join_ok(payload, now)?;
        self.execute(outcome.commands);
        Ok(outcome.frame)
    }

    pub fn keypress(&mut self) {
        let now = self.now();
        let commands = self.viewer.keypress(now);
        self.execute(commands);
    }

    pub fn server_push(&mut self, payload: &str) -> Result<Option<FrameStats>> {
        let event = self.viewer.session().tick_event().to_owned();
        self.viewer.server_push(&event, payload)
    }

    /// Fire the earliest timer `lateness` after its due time (or now, if the
    /// clock is already past that).
    pub fn fire_next_late(&mut self, lateness: Duration) -> Option<FiredTimer> {
        let Reverse(timer) = self.timers.pop()?;
        self.clock.advance_to(timer.due.saturating_add(lateness));
        let fired_at = self.now();
        let commands = self.viewer.timer_fired(timer.chain, fired_at);
        let pushed = self.execute(commands);
        Some(FiredTimer {
            chain: timer.chain,
            due: timer.due,
            fired_at,
            pushed,
        })
    }

    pub fn fire_next(&mut self) -> Option<FiredTimer> {
        self.fire_next_late(Duration::ZERO)
    }

    /// Fire every timer due at or before `deadline`, then park the clock
    /// there.
    pub fn run_until(&mut self, deadline: Duration) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        while self.next_due().is_some_and(|due| due <= deadline) {
            if let Some(timer) = self.fire_next() {
                fired.push(timer);
            }
        }
        self.clock.advance_to(deadline);
        fired
    }
}
