#![forbid(unsafe_code)]

//! WASM frontend for lifeview.
//!
//! Binds `lifeview-core` to the browser:
//! - the `<canvas>` 2D context as the render [`Surface`](lifeview_core::Surface),
//! - a phoenix socket/channel for join, server ticks and outbound tick pushes,
//! - `setTimeout` one-shots for the tick chain, timed with `performance.now()`,
//! - a body-level `keypress` listener for play/pause,
//! - `tracing` output routed to the browser console.
//!
//! JS entry point: `mount(options?)` returns a [`LifeView`] handle.

pub mod logging;
pub mod options;

#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod phoenix;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{LifeView, mount};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct LifeView;

#[cfg(not(target_arch = "wasm32"))]
impl LifeView {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
