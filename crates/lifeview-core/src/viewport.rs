#![forbid(unsafe_code)]

//! Viewport calibration.
//!
//! Sizes the canvas pixel buffer to `window inner size × pixel ratio`, keeps
//! the CSS size at the unscaled window size and pre-scales the context, so
//! everything drawn afterwards is expressed in CSS pixels and stays crisp on
//! high-density displays.
//!
//! The pixel ratio is `devicePixelRatio / backingStoreRatio`. Older WebKit and
//! Gecko builds expose the backing-store ratio under vendor prefixes; modern
//! browsers expose none of them, in which case it is `1`.

use tracing::info;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::surface::Surface;

/// Context properties probed for the backing-store ratio, in order.
pub const BACKING_STORE_PROPERTIES: [&str; 5] = [
    "backingStorePixelRatio",
    "webkitBackingStorePixelRatio",
    "mozBackingStorePixelRatio",
    "msBackingStorePixelRatio",
    "oBackingStorePixelRatio",
];

/// Window measurements read by the host at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMetrics {
    pub inner_width: f64,
    pub inner_height: f64,
    /// `window.devicePixelRatio`, absent on very old browsers.
    pub device_pixel_ratio: Option<f64>,
}

impl WindowMetrics {
    #[must_use]
    pub const fn new(inner_width: f64, inner_height: f64, device_pixel_ratio: Option<f64>) -> Self {
        Self {
            inner_width,
            inner_height,
            device_pixel_ratio,
        }
    }
}

/// Result of calibration, shared by reference with the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pixel_ratio: f64,
    pub logical_width: f64,
    pub logical_height: f64,
    pub buffer_width: u32,
    pub buffer_height: u32,
    /// Cell edge length in logical pixels.
    pub cell_size: f64,
}

/// A usable ratio: finite and strictly positive.
fn usable(ratio: Option<f64>) -> Option<f64> {
    ratio.filter(|r| r.is_finite() && *r > 0.0)
}

/// First vendor-prefixed backing-store ratio the context exposes, else `1`.
#[must_use]
pub fn backing_store_ratio<S: Surface + ?Sized>(surface: &S) -> f64 {
    BACKING_STORE_PROPERTIES
        .iter()
        .find_map(|name| usable(surface.context_property(name)))
        .unwrap_or(1.0)
}

/// `devicePixelRatio / backingStoreRatio`, with `1` substituted for a
/// missing device ratio.
#[must_use]
pub fn effective_pixel_ratio(device_pixel_ratio: Option<f64>, backing_store: f64) -> f64 {
    usable(device_pixel_ratio).unwrap_or(1.0) / backing_store
}

/// Truncate like the DOM's `unsigned long` conversion of `canvas.width`.
fn buffer_extent(logical: f64, ratio: f64) -> u32 {
    let scaled = (logical * ratio).trunc();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Calibrate `surface` for `metrics` and return the resulting viewport.
pub fn calibrate<S: Surface + ?Sized>(
    surface: &mut S,
    metrics: WindowMetrics,
    config: &ViewerConfig,
) -> Result<Viewport> {
    let WindowMetrics {
        inner_width,
        inner_height,
        device_pixel_ratio,
    } = metrics;
    if !(inner_width.is_finite() && inner_height.is_finite())
        || inner_width <= 0.0
        || inner_height <= 0.0
    {
        return Err(ViewerError::InvalidViewport(format!(
            "window size {inner_width}x{inner_height}"
        )));
    }

    let ratio = effective_pixel_ratio(device_pixel_ratio, backing_store_ratio(&*surface));
    let max_extent = f64::from(u32::MAX);
    if !ratio.is_finite()
        || ratio <= 0.0
        || inner_width * ratio >= max_extent
        || inner_height * ratio >= max_extent
    {
        return Err(ViewerError::InvalidViewport(format!("pixel ratio {ratio}")));
    }
    let buffer_width = buffer_extent(inner_width, ratio);
    let buffer_height = buffer_extent(inner_height, ratio);

    // Resizing resets the context, so scale and fill must come after.
    surface.set_buffer_size(buffer_width, buffer_height);
    surface.set_css_size(inner_width, inner_height);
    surface.scale(ratio, ratio);
    surface.set_fill_style(&config.fill_style);

    info!(
        ratio,
        buffer_width,
        buffer_height,
        logical_width = inner_width,
        logical_height = inner_height,
        "viewport calibrated"
    );

    Ok(Viewport {
        pixel_ratio: ratio,
        logical_width: inner_width,
        logical_height: inner_height,
        buffer_width,
        buffer_height,
        cell_size: f64::from(config.cell_size),
    })
}
