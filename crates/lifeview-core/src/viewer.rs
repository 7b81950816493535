#![forbid(unsafe_code)]

//! Host-driven viewer.
//!
//! [`Viewer`] ties calibration, rendering, the channel session and the tick
//! loop together behind callbacks the host invokes as events arrive. It never
//! blocks and never reads a clock: the host passes `now` with each call and
//! executes the returned [`TickCommand`]s.
//!
//! 1. [`Viewer::new`] calibrates the surface (fails fast without one).
//! 2. [`Viewer::connect`] once the socket connect is issued.
//! 3. [`Viewer::join_ok`] / [`Viewer::join_error`] from the join reply.
//! 4. [`Viewer::server_push`] for every inbound channel event.
//! 5. [`Viewer::keypress`] and [`Viewer::timer_fired`] drive the tick loop.

use core::time::Duration;

use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::render::{FrameRenderer, FrameStats};
use crate::session::{ChannelSession, SessionState};
use crate::snapshot::Snapshot;
use crate::surface::Surface;
use crate::tick::{ChainId, PlayState, TickCommand, TickCoordinator, TickStats};
use crate::viewport::{Viewport, WindowMetrics, calibrate};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// `false` when the transport replayed the join reply after a reconnect.
    pub first_join: bool,
    /// Commands to execute (a chain start if play was requested pre-join).
    pub commands: Vec<TickCommand>,
    /// The initial frame, or `None` if the ack payload was rejected.
    pub frame: Option<FrameStats>,
}

pub struct Viewer<S: Surface> {
    config: ViewerConfig,
    surface: S,
    viewport: Viewport,
    renderer: FrameRenderer,
    session: ChannelSession,
    ticks: TickCoordinator,
    rejected_payloads: u64,
}

impl<S: Surface> Viewer<S> {
    /// Validate `config` and calibrate `surface` for `metrics`.
    pub fn new(mut surface: S, metrics: WindowMetrics, config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        let viewport = calibrate(&mut surface, metrics, &config)?;
        Ok(Self {
            session: ChannelSession::new(&config),
            ticks: TickCoordinator::new(config.tick_interval()),
            renderer: FrameRenderer::new(),
            rejected_payloads: 0,
            config,
            surface,
            viewport,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub const fn session(&self) -> &ChannelSession {
        &self.session
    }

    #[must_use]
    pub const fn session_state(&self) -> SessionState {
        self.session.state()
    }

    #[must_use]
    pub const fn play_state(&self) -> PlayState {
        self.ticks.play_state()
    }

    #[must_use]
    pub fn live_chain(&self) -> Option<ChainId> {
        self.ticks.live_chain()
    }

    #[must_use]
    pub const fn tick_stats(&self) -> &TickStats {
        self.ticks.stats()
    }

    #[must_use]
    pub const fn frame_stats(&self) -> Option<FrameStats> {
        self.renderer.last_frame()
    }

    /// Payloads rejected at ingress so far.
    #[must_use]
    pub const fn rejected_payloads(&self) -> u64 {
        self.rejected_payloads
    }

    pub fn connect(&mut self) -> Result<()> {
        self.session.connect()
    }

    /// Join acknowledged: paint the snapshot carried by the ack and start
    /// ticking if play was already requested. A reply replayed while still
    /// joined only repaints; one arriving after a join error also resumes
    /// ticking.
    pub fn join_ok(&mut self, payload: &str, now: Duration) -> Result<JoinOutcome> {
        let was_joined = self.session.state() == SessionState::Joined;
        let first_join = self.session.join_ok()?;
        let commands = if was_joined {
            Vec::new()
        } else {
            self.ticks.set_joined(now).into_iter().collect()
        };
        let frame = self.ingest(payload).ok();
        Ok(JoinOutcome {
            first_join,
            commands,
            frame,
        })
    }

    /// Join refused. Pushes are dropped and any live tick chain winds down
    /// until the transport's retry is acknowledged; the canvas keeps
    /// whatever it shows.
    pub fn join_error(&mut self, reason: &str) -> ViewerError {
        self.ticks.set_left();
        self.session.join_error(reason)
    }

    /// Inbound channel event. Returns `Ok(None)` for events the viewer does
    /// not render (other names, or anything before the join).
    pub fn server_push(&mut self, event: &str, payload: &str) -> Result<Option<FrameStats>> {
        if !self.session.accepts_push(event) {
            debug!(event, state = self.session.state().name(), "ignoring channel event");
            return Ok(None);
        }
        self.ingest(payload).map(Some)
    }

    /// Decode first, draw second: a bad payload never clears the canvas.
    fn ingest(&mut self, payload: &str) -> Result<FrameStats> {
        match Snapshot::from_json_str(payload) {
            Ok(snapshot) => Ok(self.render(&snapshot)),
            Err(err) => {
                self.rejected_payloads += 1;
                warn!(error = %err, "rejected snapshot, keeping last frame");
                Err(err)
            }
        }
    }

    /// Paint an already-validated snapshot.
    pub fn render(&mut self, snapshot: &Snapshot) -> FrameStats {
        self.renderer
            .render(&mut self.surface, &self.viewport, snapshot)
    }

    /// Any key toggles play state.
    pub fn keypress(&mut self, now: Duration) -> Vec<TickCommand> {
        self.ticks.toggle(now).into_iter().collect()
    }

    pub fn timer_fired(&mut self, chain: ChainId, now: Duration) -> Vec<TickCommand> {
        self.ticks.fire(chain, now)
    }
}

impl<S: Surface + core::fmt::Debug> core::fmt::Debug for Viewer<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Viewer")
            .field("surface", &self.surface)
            .field("viewport", &self.viewport)
            .field("session", &self.session.state())
            .field("play", &self.ticks.play_state())
            .finish_non_exhaustive()
    }
}
