#![forbid(unsafe_code)]

//! Full-frame renderer.
//!
//! Every frame clears the whole buffer region and paints one solid square per
//! occupied cell. There is no diffing against the previous snapshot, so a
//! repaint is idempotent and cells absent from the new snapshot never leave
//! artifacts behind.

use tracing::{debug_span, trace};

use crate::snapshot::Snapshot;
use crate::surface::Surface;
use crate::viewport::Viewport;

/// Accounting for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Monotonic frame index, starting at 1 for the first frame.
    pub frame_idx: u64,
    pub cells_painted: usize,
}

/// Paints snapshots onto a calibrated surface.
#[derive(Debug, Clone, Default)]
pub struct FrameRenderer {
    frames_rendered: u64,
    last: Option<FrameStats>,
}

impl FrameRenderer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_rendered: 0,
            last: None,
        }
    }

    /// Clear the surface and paint `snapshot`.
    pub fn render<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        viewport: &Viewport,
        snapshot: &Snapshot,
    ) -> FrameStats {
        self.frames_rendered += 1;
        let _span = debug_span!(
            "lifeview.render.frame",
            frame_idx = self.frames_rendered,
            cells = snapshot.len()
        )
        .entered();

        // The clear is issued in context units over the buffer extent, which
        // covers at least the whole visible area for any ratio >= 1.
        let (width, height) = surface.buffer_size();
        surface.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));

        let size = viewport.cell_size;
        for cell in snapshot.iter() {
            surface.fill_rect(f64::from(cell.x) * size, f64::from(cell.y) * size, size, size);
        }

        let stats = FrameStats {
            frame_idx: self.frames_rendered,
            cells_painted: snapshot.len(),
        };
        trace!(?stats, "frame painted");
        self.last = Some(stats);
        stats
    }

    #[must_use]
    pub const fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    #[must_use]
    pub const fn last_frame(&self) -> Option<FrameStats> {
        self.last
    }
}
