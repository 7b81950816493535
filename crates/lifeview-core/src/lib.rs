#![forbid(unsafe_code)]

//! `lifeview-core` is the host-agnostic half of the lifeview automaton viewer.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) reports socket
//!   replies, channel pushes, keypresses and timer firings as they happen.
//! - **Deterministic time**: every callback receives `now` from the host; the
//!   core never reads a clock.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. `lifeview-web` wraps it with
//! the browser canvas, the phoenix channel and `setTimeout`.
//!
//! # Components
//!
//! - [`viewport`]: pixel-ratio aware canvas calibration.
//! - [`render`]: full-frame snapshot painting.
//! - [`tick`]: drift-corrected, pausable tick chain.
//! - [`session`]: channel lifecycle.
//! - [`viewer`]: all of the above behind host callbacks.
//! - [`harness`]: a virtual-time host for tests and replays.

pub mod clock;
pub mod config;
pub mod error;
pub mod harness;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod surface;
pub mod tick;
pub mod viewer;
pub mod viewport;

pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use render::{FrameRenderer, FrameStats};
pub use session::{ChannelSession, SessionState};
pub use snapshot::{CellPosition, Snapshot};
pub use surface::{RasterSurface, Surface};
pub use tick::{ChainId, PlayState, TickCommand, TickCoordinator, TickStats};
pub use viewer::{JoinOutcome, Viewer};
pub use viewport::{Viewport, WindowMetrics, calibrate};
