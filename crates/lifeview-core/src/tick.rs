#![forbid(unsafe_code)]

//! Drift-corrected tick coordination.
//!
//! While the viewer is playing, it asks the server for one generation per
//! nominal interval. The loop is a *chain* of one-shot timers: each firing
//! pushes a tick and schedules the next firing itself. The next delay is
//! shortened or lengthened by however much the previous cycle overran or
//! underran, so the push-to-push period converges on the interval despite
//! render time, network latency and scheduler jitter:
//!
//! ```text
//! drift      = (now - last_sent) - interval
//! next_delay = interval - drift            (negative => 0)
//! ```
//!
//! [`TickCoordinator`] never owns a timer. It returns [`TickCommand`]s and the
//! host (browser `setTimeout`, or [`crate::harness::SimulatedHost`]) carries
//! them out and reports firings back with the chain id it was given.
//!
//! # Pausing
//!
//! There is no cancellation. Pausing only flips [`PlayState`]; the in-flight
//! firing sees `Idle`, pushes nothing and does not reschedule, which ends the
//! chain. Resuming before that firing happens adopts the still-pending chain
//! rather than starting a second one, so at most one chain is ever live.
//!
//! ```
//! use core::time::Duration;
//! use lifeview_core::tick::{TickCommand, TickCoordinator};
//!
//! let ms = Duration::from_millis;
//! let mut ticks = TickCoordinator::new(ms(100));
//! ticks.set_joined(ms(0));
//!
//! let Some(TickCommand::Schedule { chain, delay }) = ticks.toggle(ms(0)) else {
//!     unreachable!()
//! };
//! assert_eq!(delay, ms(100));
//!
//! // Fired 20ms late: push now, come back 20ms early.
//! let cmds = ticks.fire(chain, ms(120));
//! assert_eq!(cmds, vec![TickCommand::PushTick, TickCommand::Schedule { chain, delay: ms(80) }]);
//! ```

use core::time::Duration;

use tracing::{debug, info, trace};

/// Identifier of one self-rescheduling timer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ChainId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// User-controlled play/pause state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Idle,
    Ticking,
}

impl PlayState {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Idle => Self::Ticking,
            Self::Ticking => Self::Idle,
        }
    }

    #[must_use]
    pub const fn is_ticking(self) -> bool {
        matches!(self, Self::Ticking)
    }
}

/// Work the host must perform, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCommand {
    /// Push one tick request on the channel.
    PushTick,
    /// Arm a one-shot timer; report it back via [`TickCoordinator::fire`].
    Schedule { chain: ChainId, delay: Duration },
}

/// Outcome of the drift-correction formula for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPlan {
    /// Delay to schedule, never negative.
    pub delay: Duration,
    /// Overshoot (positive) or undershoot (negative) of the last cycle.
    pub drift_us: i64,
    /// The signed value before clamping.
    pub raw_delay_us: i64,
}

impl DelayPlan {
    #[must_use]
    pub const fn clamped(&self) -> bool {
        self.raw_delay_us < 0
    }
}

fn signed_micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

/// Next delay after a cycle that took `elapsed` against a nominal `interval`.
#[must_use]
pub fn drift_corrected_delay(interval: Duration, elapsed: Duration) -> DelayPlan {
    let interval_us = signed_micros(interval);
    let drift_us = signed_micros(elapsed).saturating_sub(interval_us);
    let raw_delay_us = interval_us.saturating_sub(drift_us);
    let delay = u64::try_from(raw_delay_us).map_or(Duration::ZERO, Duration::from_micros);
    DelayPlan {
        delay,
        drift_us,
        raw_delay_us,
    }
}

/// Counters describing the tick loop so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub toggles: u64,
    pub ticks_sent: u64,
    pub chains_started: u64,
    pub chains_adopted: u64,
    pub chains_ended: u64,
    pub stale_firings: u64,
    /// Cycles whose corrected delay came out negative and fired at once.
    pub clamped_delays: u64,
    pub last_drift_us: Option<i64>,
    pub last_raw_delay_us: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
struct LiveChain {
    id: ChainId,
    last_sent: Duration,
}

/// Play state plus the single live timer chain.
#[derive(Debug, Clone)]
pub struct TickCoordinator {
    interval: Duration,
    play: PlayState,
    joined: bool,
    next_chain: u64,
    live: Option<LiveChain>,
    stats: TickStats,
}

impl TickCoordinator {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            play: PlayState::Idle,
            joined: false,
            next_chain: 1,
            live: None,
            stats: TickStats::default(),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub const fn play_state(&self) -> PlayState {
        self.play
    }

    /// The chain whose timer is pending, if any. It may be winding down.
    #[must_use]
    pub fn live_chain(&self) -> Option<ChainId> {
        self.live.map(|c| c.id)
    }

    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Mark the channel joined. A play request made before the join starts
    /// its chain now.
    pub fn set_joined(&mut self, now: Duration) -> Option<TickCommand> {
        self.joined = true;
        if self.play.is_ticking() && self.live.is_none() {
            return Some(self.start_chain(now));
        }
        None
    }

    /// Mark the channel lost. A pending chain ends at its next firing
    /// without pushing; play state is kept so ticking resumes on rejoin.
    pub fn set_left(&mut self) {
        if self.joined {
            debug!(live = self.live.is_some(), "channel lost, tick chain will wind down");
        }
        self.joined = false;
    }

    /// Flip play state in response to a user keypress.
    pub fn toggle(&mut self, now: Duration) -> Option<TickCommand> {
        self.play = self.play.toggled();
        self.stats.toggles += 1;
        info!(state = ?self.play, "play state toggled");

        if !self.play.is_ticking() || !self.joined {
            return None;
        }
        match self.live {
            Some(chain) => {
                self.stats.chains_adopted += 1;
                debug!(chain = %chain.id, "resuming chain still pending from before pause");
                None
            }
            None => Some(self.start_chain(now)),
        }
    }

    fn start_chain(&mut self, now: Duration) -> TickCommand {
        let id = ChainId(self.next_chain);
        self.next_chain += 1;
        self.live = Some(LiveChain { id, last_sent: now });
        self.stats.chains_started += 1;
        debug!(
            chain = %id,
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "tick chain started"
        );
        TickCommand::Schedule {
            chain: id,
            delay: self.interval,
        }
    }

    /// Handle a timer firing for `chain` at `now`.
    pub fn fire(&mut self, chain: ChainId, now: Duration) -> Vec<TickCommand> {
        let Some(live) = self.live.as_mut().filter(|live| live.id == chain) else {
            self.stats.stale_firings += 1;
            trace!(chain = %chain, "ignoring firing of a dead chain");
            return Vec::new();
        };

        if !self.play.is_ticking() || !self.joined {
            self.live = None;
            self.stats.chains_ended += 1;
            debug!(chain = %chain, joined = self.joined, "tick chain ended");
            return Vec::new();
        }

        let plan = drift_corrected_delay(self.interval, now.saturating_sub(live.last_sent));
        live.last_sent = now;

        self.stats.ticks_sent += 1;
        self.stats.last_drift_us = Some(plan.drift_us);
        self.stats.last_raw_delay_us = Some(plan.raw_delay_us);
        if plan.clamped() {
            self.stats.clamped_delays += 1;
            debug!(
                chain = %chain,
                raw_delay_us = plan.raw_delay_us,
                "cycle overran by more than one interval, firing immediately"
            );
        }
        trace!(
            chain = %chain,
            drift_us = plan.drift_us,
            delay_us = u64::try_from(plan.delay.as_micros()).unwrap_or(u64::MAX),
            "tick"
        );

        vec![
            TickCommand::PushTick,
            TickCommand::Schedule {
                chain,
                delay: plan.delay,
            },
        ]
    }
}
