//! Property-based invariant tests for rendering and tick coordination.
//!
//! Verifies:
//! 1. Idempotent render: painting the same snapshot twice yields the same frame
//! 2. Scale invariant: buffer = inner size × ratio; logical (x, y) lands on (x·r, y·r)
//! 3. Snapshot replacement: rendering B after A equals rendering B alone
//! 4. Order independence: shuffling a snapshot does not change the frame
//! 5. Toggle parity: odd toggles => Ticking, even => Idle; never two live chains
//! 6. Drift correction: next_i = interval - (elapsed_i - interval)
//! 7. Anchoring: each next firing is due two intervals after the push before last

use core::time::Duration;

use lifeview_core::config::ViewerConfig;
use lifeview_core::harness::SimulatedHost;
use lifeview_core::render::FrameRenderer;
use lifeview_core::snapshot::{CellPosition, Snapshot};
use lifeview_core::surface::{RasterSurface, Surface};
use lifeview_core::tick::{PlayState, drift_corrected_delay};
use lifeview_core::viewer::Viewer;
use lifeview_core::viewport::{Viewport, WindowMetrics, calibrate};
use proptest::prelude::*;

const INTERVAL_MS: u64 = 100;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_cell() -> impl Strategy<Value = CellPosition> {
    (-2i32..12, -2i32..12).prop_map(|(x, y)| CellPosition::new(x, y))
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    prop::collection::vec(arb_cell(), 0..24).prop_map(Snapshot::new)
}

fn calibrated(ratio: f64) -> (RasterSurface, Viewport) {
    let mut surface = RasterSurface::new(1, 1);
    let cfg = ViewerConfig {
        cell_size: 4,
        ..ViewerConfig::default()
    };
    let viewport = calibrate(
        &mut surface,
        WindowMetrics::new(40.0, 40.0, Some(ratio)),
        &cfg,
    )
    .expect("calibrate");
    (surface, viewport)
}

fn joined_host() -> SimulatedHost<RasterSurface> {
    let viewer = Viewer::new(
        RasterSurface::new(1, 1),
        WindowMetrics::new(32.0, 32.0, Some(1.0)),
        ViewerConfig::default(),
    )
    .expect("viewer");
    let mut host = SimulatedHost::new(viewer);
    host.connect_and_join(r#"{"positions":[]}"#).expect("join");
    host
}

// ── Rendering ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn render_is_idempotent(snap in arb_snapshot(), ratio in 1u32..=3) {
        let (mut surface, vp) = calibrated(f64::from(ratio));
        let mut renderer = FrameRenderer::new();
        renderer.render(&mut surface, &vp, &snap);
        let once = surface.frame_hash();
        renderer.render(&mut surface, &vp, &snap);
        prop_assert_eq!(surface.frame_hash(), once);
    }

    #[test]
    fn buffer_and_transform_follow_ratio(
        width in 1u32..400,
        height in 1u32..400,
        ratio in 1u32..=4,
        x in 0u32..40,
        y in 0u32..40,
    ) {
        let mut surface = RasterSurface::new(1, 1);
        calibrate(
            &mut surface,
            WindowMetrics::new(f64::from(width), f64::from(height), Some(f64::from(ratio))),
            &ViewerConfig::default(),
        )
        .expect("calibrate");
        prop_assert_eq!(surface.buffer_size(), (width * ratio, height * ratio));

        surface.fill_rect(f64::from(x), f64::from(y), 1.0, 1.0);
        let expected = if x < width && y < height { Some(0x0000_00FF) } else { None };
        prop_assert_eq!(surface.pixel(x * ratio, y * ratio), expected);
    }

    #[test]
    fn new_snapshot_leaves_no_trace_of_old(a in arb_snapshot(), b in arb_snapshot()) {
        let (mut replaced, vp) = calibrated(2.0);
        let mut renderer = FrameRenderer::new();
        renderer.render(&mut replaced, &vp, &a);
        renderer.render(&mut replaced, &vp, &b);

        let (mut fresh, vp) = calibrated(2.0);
        FrameRenderer::new().render(&mut fresh, &vp, &b);

        prop_assert_eq!(replaced.frame_hash(), fresh.frame_hash());
    }

    #[test]
    fn iteration_order_is_irrelevant(cells in prop::collection::vec(arb_cell(), 0..24)) {
        let (mut forward, vp) = calibrated(1.0);
        FrameRenderer::new().render(&mut forward, &vp, &Snapshot::new(cells.clone()));

        let mut reversed_cells = cells;
        reversed_cells.reverse();
        let (mut reversed, vp) = calibrated(1.0);
        FrameRenderer::new().render(&mut reversed, &vp, &Snapshot::new(reversed_cells));

        prop_assert_eq!(forward.frame_hash(), reversed.frame_hash());
    }
}

// ── Tick coordination ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn toggle_parity_and_single_chain(gaps in prop::collection::vec(0u64..250, 1..40)) {
        let mut host = joined_host();
        for (i, gap) in gaps.iter().enumerate() {
            let target = host.now() + Duration::from_millis(*gap);
            host.run_until(target);
            host.keypress();

            let expected = if (i + 1) % 2 == 1 { PlayState::Ticking } else { PlayState::Idle };
            prop_assert_eq!(host.viewer().play_state(), expected);
            prop_assert!(host.pending_chains() <= 1);
        }
        host.run_until(host.now() + Duration::from_secs(1));
        prop_assert!(host.max_pending_chains() <= 1);
        if gaps.len() % 2 == 0 {
            prop_assert_eq!(host.pending_chains(), 0);
        } else {
            prop_assert_eq!(host.pending_chains(), 1);
        }
    }

    #[test]
    fn next_delay_compensates_previous_cycle(lateness in prop::collection::vec(0u64..50, 2..30)) {
        let mut host = joined_host();
        host.keypress();
        for late in &lateness {
            host.fire_next_late(Duration::from_millis(*late)).expect("armed timer");
        }

        let interval = Duration::from_millis(INTERVAL_MS);
        let pushes = host.pushes();
        // The first delay is the chain start; each push then schedules one.
        let delays = &host.scheduled_delays()[1..];
        prop_assert_eq!(pushes.len(), delays.len());

        let mut last_sent = Duration::ZERO;
        for (push, delay) in pushes.iter().zip(delays) {
            let elapsed = *push - last_sent;
            let expected = (interval * 2).saturating_sub(elapsed);
            prop_assert_eq!(*delay, expected);
            prop_assert_eq!(*delay, drift_corrected_delay(interval, elapsed).delay);
            last_sent = *push;
        }
    }

    #[test]
    fn next_firing_is_anchored_to_the_push_before_last(
        lateness in prop::collection::vec(0u64..120, 1..40),
    ) {
        let interval = Duration::from_millis(INTERVAL_MS);
        let mut host = joined_host();
        host.keypress();

        let mut previous = Duration::ZERO;
        for late in &lateness {
            let fired = host.fire_next_late(Duration::from_millis(*late)).expect("armed timer");
            prop_assert!(fired.pushed);
            let next_due = host.next_due().expect("rescheduled");
            prop_assert_eq!(next_due, fired.fired_at.max(previous + interval * 2));
            previous = fired.fired_at;
        }
    }
}
