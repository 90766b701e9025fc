//! Plot orchestration tests against the recording mock context (no GPU required).

use glam::{Vec2, Vec4};
use glint_plot::*;
use glint_test_utils::{MockRasterContext, UniformValue};
use std::sync::Arc;

struct Harness {
    plot: Plot,
    ctx: Arc<MockRasterContext>,
    scheduler: Arc<ManualFrameScheduler>,
}

impl Harness {
    fn new(config: PlotConfig) -> Self {
        Self::with_display(config, DisplayContext::new(400.0, 300.0))
    }

    fn with_display(config: PlotConfig, display: DisplayContext) -> Self {
        let ctx = Arc::new(MockRasterContext::new());
        Self::with_context(config, display, ctx)
    }

    fn with_context(
        config: PlotConfig,
        display: DisplayContext,
        ctx: Arc<MockRasterContext>,
    ) -> Self {
        let scheduler = Arc::new(ManualFrameScheduler::new());
        let plot = Plot::new(ctx.clone(), config, display, scheduler.clone()).unwrap();
        Self {
            plot,
            ctx,
            scheduler,
        }
    }

    /// Deliver the pending animation frame, if any.
    fn frame(&mut self) {
        if self.scheduler.take_pending() {
            self.plot.on_animation_frame();
        }
    }
}

fn peak_series() -> SeriesConfig {
    SeriesConfig::new("x", "y").with_data([(0.0, 0.0), (5.0, 1.0), (10.0, 0.0)])
}

fn fixed_axes() -> PlotConfig {
    PlotConfig::new()
        .with_axis("x", AxisConfig::x().with_range(0.0, 10.0))
        .with_axis("y", AxisConfig::y().with_range(0.0, 1.0))
}

fn interactive_axes() -> PlotConfig {
    PlotConfig::new()
        .with_axis(
            "x",
            AxisConfig::x()
                .with_range(0.0, 10.0)
                .with_pan(PanLimits::unbounded())
                .with_zoom(ZoomLimits::unbounded()),
        )
        .with_axis(
            "y",
            AxisConfig::y()
                .with_range(0.0, 1.0)
                .with_pan(PanLimits::unbounded())
                .with_zoom(ZoomLimits::unbounded()),
        )
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_solid_line_end_to_end() {
    let config = fixed_axes().with_series(
        "s",
        peak_series().with_material(LINE_SOLID, ParameterSet::new().with("width", 2.0)),
    );
    let h = Harness::new(config);

    let set = h
        .plot
        .buffer_set(BufferOwner::Series("s".into()), LINE_SOLID)
        .expect("series buffers");
    assert_eq!(set.index_count(), 18);
    assert_eq!(set.triangle_count(), 6);

    let positions = h.ctx.buffer_contents(set.attribute("position").unwrap()).unwrap();
    let tangents = h.ctx.buffer_contents(set.attribute("tangent").unwrap()).unwrap();
    let indices = h.ctx.buffer_contents(set.index_buffer()).unwrap();
    let positions = positions.as_f32().unwrap();
    let tangents = tangents.as_f32().unwrap();
    let indices = indices.as_u32().unwrap();
    assert_eq!(positions.len(), 2 * 8);

    // Expand the stroke in pixel space the way the vertex stage does.
    let x = h.plot.axis("x").unwrap();
    let y = h.plot.axis("y").unwrap();
    let transforms = Transforms::data(x.domain(), y.domain(), &h.plot.layout().viewport);
    let m = transforms.data_to_pixels;
    let expanded: Vec<Vec2> = positions
        .chunks_exact(2)
        .zip(tangents.chunks_exact(2))
        .map(|(p, t)| {
            let pixel = (m * Vec4::new(p[0], p[1], 0.0, 1.0)).truncate().truncate();
            let dir = (m * Vec4::new(t[0], t[1], 0.0, 0.0)).truncate().truncate().normalize();
            pixel + Vec2::new(-dir.y, dir.x)
        })
        .collect();

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [0, 1, 2].map(|k| expanded[tri[k] as usize]);
        let area = (b - a).perp_dot(c - a);
        assert!(area > 0.0, "triangle {:?} has area {}", tri, area);
    }

    let draw = &h.ctx.draws()[0];
    assert_eq!(draw.uniform("width"), Some(UniformValue::Float(2.0)));
    assert_eq!(draw.index_count, 18);
}

#[test]
fn test_gap_splits_series() {
    let config = fixed_axes().with_series(
        "s",
        SeriesConfig::new("x", "y")
            .with_data([Some((0.0, 0.0)), Some((1.0, 1.0)), None, Some((2.0, 0.0)), Some((3.0, 1.0))])
            .with_material(LINE_SOLID, ParameterSet::new()),
    );
    let h = Harness::new(config);

    let set = h
        .plot
        .buffer_set(BufferOwner::Series("s".into()), LINE_SOLID)
        .unwrap();
    // Two unbridged segments.
    assert_eq!(set.index_count(), 12);
}

// ============================================================================
// Draw pass
// ============================================================================

#[test]
fn test_draw_order_and_viewports() {
    let config = PlotConfig::new()
        .with_margins(Margins::new(40.0, 10.0, 10.0, 30.0))
        .with_axis(
            "x",
            AxisConfig::x()
                .with_range(0.0, 10.0)
                .with_grid(LINE_SOLID, ParameterSet::new())
                .with_material(LINE_SOLID, ParameterSet::new()),
        )
        .with_axis(
            "y",
            AxisConfig::y()
                .with_range(0.0, 1.0)
                .with_material(LINE_SOLID, ParameterSet::new()),
        )
        .with_series(
            "s",
            peak_series()
                .with_material(FILL, ParameterSet::new())
                .with_material(LINE_SOLID, ParameterSet::new()),
        );
    let h = Harness::new(config);
    let draws = h.ctx.draws();
    assert_eq!(draws.len(), 5);
    assert_eq!(h.ctx.count_clears(), 1);

    let expected = [
        (BufferOwner::Series("s".into()), FILL),
        (BufferOwner::Series("s".into()), LINE_SOLID),
        (BufferOwner::Grid("x".into()), LINE_SOLID),
        (BufferOwner::Axis("x".into()), LINE_SOLID),
        (BufferOwner::Axis("y".into()), LINE_SOLID),
    ];
    for (draw, (owner, material)) in draws.iter().zip(expected) {
        let set = h.plot.buffer_set(owner.clone(), material).unwrap();
        assert_eq!(draw.index_buffer, Some(set.index_buffer()), "{:?}", owner);
        assert!(draw.blending);
    }

    assert_eq!(draws[0].viewport, Some([40, 30, 350, 260]));
    assert_eq!(draws[2].viewport, Some([0, 0, 400, 300]));
}

#[test]
fn test_width_scaled_by_pixel_ratio() {
    let config = fixed_axes().with_series(
        "s",
        peak_series().with_material(LINE_SOLID, ParameterSet::new().with("width", 2.0)),
    );
    let h = Harness::with_display(
        config,
        DisplayContext::new(400.0, 300.0).with_device_pixel_ratio(2.0),
    );

    let draw = &h.ctx.draws()[0];
    assert_eq!(draw.uniform("width"), Some(UniformValue::Float(4.0)));
    assert_eq!(draw.viewport, Some([0, 0, 800, 600]));
}

#[test]
fn test_unknown_material_is_skipped() {
    let config = fixed_axes().with_series(
        "s",
        peak_series()
            .with_material("sparkles", ParameterSet::new())
            .with_material(LINE_SOLID, ParameterSet::new()),
    );
    let h = Harness::new(config);
    assert_eq!(h.ctx.count_draws(), 1);
}

#[test]
fn test_broken_material_does_not_stop_plot() {
    let ctx = Arc::new(MockRasterContext::new());
    ctx.fail_shaders_containing("does-not-compile");

    let broken = MaterialDescriptor {
        vertex_source: "does-not-compile".into(),
        ..MaterialDescriptor::line_solid()
    };
    let config = fixed_axes()
        .with_material("broken", broken)
        .with_series(
            "s",
            peak_series()
                .with_material("broken", ParameterSet::new())
                .with_material(LINE_SOLID, ParameterSet::new()),
        );
    let h = Harness::with_context(config, DisplayContext::new(400.0, 300.0), ctx);

    assert!(!h.plot.material("broken").unwrap().is_valid());
    assert!(h.plot.buffer_set(BufferOwner::Series("s".into()), "broken").is_none());
    assert_eq!(h.ctx.count_draws(), 1);
}

// ============================================================================
// Update cycle
// ============================================================================

#[test]
fn test_resize_storm_coalesces() {
    let mut h = Harness::new(fixed_axes());
    h.frame();

    assert!(h.plot.resize(DisplayContext::new(500.0, 300.0)));
    assert!(!h.plot.resize(DisplayContext::new(600.0, 300.0)));
    assert!(!h.plot.resize(DisplayContext::new(700.0, 300.0)));
    assert_eq!(h.plot.layout().container.width, 500.0);
    assert_eq!(h.scheduler.request_count(), 2);

    h.frame();
    assert!(h.plot.resize(DisplayContext::new(700.0, 300.0)));
    assert_eq!(h.plot.layout().container.width, 700.0);
    assert_eq!(h.plot.axis("x").unwrap().pixel_extent(), (0.0, 700.0));
}

#[test]
fn test_regeneration_releases_old_buffers() {
    let config = fixed_axes().with_series(
        "s",
        peak_series()
            .with_material(FILL, ParameterSet::new())
            .with_material(LINE_DASHED, ParameterSet::new()),
    );
    let mut h = Harness::new(config);
    let live = h.ctx.live_buffer_count();
    assert!(live > 0);

    for shift in 1..=5 {
        h.frame();
        let s = shift as f64;
        assert!(h.plot.set_series_data("s", [(0.0, s), (5.0, 1.0), (10.0, 0.0)]));
    }
    assert_eq!(h.ctx.live_buffer_count(), live);
    assert!(h.ctx.count_buffer_deletes() > 0);
}

#[test]
fn test_empty_series_has_no_buffers() {
    let config = fixed_axes().with_series(
        "s",
        SeriesConfig::new("x", "y").with_material(LINE_SOLID, ParameterSet::new()),
    );
    let h = Harness::new(config);
    assert!(h.plot.buffer_set(BufferOwner::Series("s".into()), LINE_SOLID).is_none());
    assert_eq!(h.ctx.count_draws(), 0);
}

#[test]
fn test_auto_range_sticks_until_reset() {
    let config = PlotConfig::new()
        .with_axis("x", AxisConfig::x())
        .with_axis("y", AxisConfig::y())
        .with_series("s", peak_series());
    let mut h = Harness::new(config);
    assert_eq!(h.plot.axis("x").unwrap().domain(), (0.0, 10.0));

    h.frame();
    h.plot.set_series_data("s", [(0.0, 0.0), (20.0, 1.0)]);
    assert_eq!(h.plot.axis("x").unwrap().domain(), (0.0, 10.0));

    h.frame();
    assert!(h.plot.reset_auto_range("x"));
    assert_eq!(h.plot.axis("x").unwrap().domain(), (0.0, 20.0));
    assert!(!h.plot.reset_auto_range("nope"));
}

#[test]
fn test_reset_while_frame_pending_keeps_data_range() {
    let config = PlotConfig::new()
        .with_axis("x", AxisConfig::x().with_pan(PanLimits::unbounded()))
        .with_axis("y", AxisConfig::y())
        .with_series(
            "s",
            SeriesConfig::new("x", "y").with_data([(100.0, 0.0), (200.0, 1.0)]),
        );
    let mut h = Harness::new(config);
    assert_eq!(h.plot.axis("x").unwrap().domain(), (100.0, 200.0));

    h.frame();
    assert!(h.plot.pan(40.0, 0.0));
    // The follow-up update is dropped, the domain is not.
    assert!(!h.plot.reset_auto_range("x"));
    assert_eq!(h.plot.axis("x").unwrap().domain(), (100.0, 200.0));
    assert!(!h.plot.axis("x").unwrap().awaits_data());

    h.frame();
    assert!(h.plot.pan(4.0, 0.0));
    let (min, max) = h.plot.axis("x").unwrap().domain();
    assert!((max - min - 100.0).abs() < 1e-9);
    assert!((min - 99.0).abs() < 1e-9);
}

#[test]
fn test_pan_before_data_still_auto_ranges() {
    let config = PlotConfig::new()
        .with_axis("x", AxisConfig::x().with_pan(PanLimits::unbounded()))
        .with_axis("y", AxisConfig::y())
        .with_series("s", SeriesConfig::new("x", "y"));
    let mut h = Harness::new(config);

    h.frame();
    assert!(h.plot.pan(40.0, 0.0));
    assert!(h.plot.axis("x").unwrap().awaits_data());

    h.frame();
    h.plot.set_series_data("s", [(3.0, 0.0), (7.0, 1.0)]);
    assert_eq!(h.plot.axis("x").unwrap().domain(), (3.0, 7.0));
}

#[test]
fn test_single_point_domain_is_widened() {
    let config = PlotConfig::new()
        .with_axis("x", AxisConfig::x())
        .with_axis("y", AxisConfig::y())
        .with_series("s", SeriesConfig::new("x", "y").with_data([(3.0, 3.0)]));
    let h = Harness::new(config);

    let x = h.plot.axis("x").unwrap();
    assert_eq!(x.domain(), (2.5, 3.5));
    assert!(x.to_pixel(3.0).is_finite());
}

#[test]
fn test_axis_without_data_waits() {
    let h = Harness::new(
        PlotConfig::new()
            .with_axis("x", AxisConfig::x())
            .with_axis("y", AxisConfig::y()),
    );
    let x = h.plot.axis("x").unwrap();
    assert!(x.awaits_data());
    assert_eq!(x.domain(), (0.0, 1.0));
}

// ============================================================================
// Interaction
// ============================================================================

#[test]
fn test_zoom_keeps_pivot_in_place() {
    let mut h = Harness::new(interactive_axes());
    h.frame();

    let (px, py) = h.plot.layout().input_to_pixel(100.0, 50.0);
    let vx = h.plot.axis("x").unwrap().from_pixel(px);
    let vy = h.plot.axis("y").unwrap().from_pixel(py);

    assert!(h.plot.zoom(0.5, 100.0, 50.0));
    let x = h.plot.axis("x").unwrap();
    let y = h.plot.axis("y").unwrap();
    assert!((x.range() - 5.0).abs() < 1e-9);
    assert!((x.to_pixel(vx) - px).abs() < 1e-9);
    assert!((y.to_pixel(vy) - py).abs() < 1e-9);
}

#[test]
fn test_zoom_respects_range_limits() {
    let config = PlotConfig::new()
        .with_axis(
            "x",
            AxisConfig::x()
                .with_range(0.0, 10.0)
                .with_zoom(ZoomLimits::between(4.0, 20.0)),
        )
        .with_axis("y", AxisConfig::y().with_range(0.0, 1.0));
    let mut h = Harness::new(config);

    h.plot.zoom(0.1, 200.0, 150.0);
    assert!((h.plot.axis("x").unwrap().range() - 4.0).abs() < 1e-9);

    h.plot.zoom(100.0, 200.0, 150.0);
    assert!((h.plot.axis("x").unwrap().range() - 20.0).abs() < 1e-9);
    // Only x zooms.
    assert_eq!(h.plot.axis("y").unwrap().domain(), (0.0, 1.0));
}

#[test]
fn test_pan_clamps_to_limits() {
    let config = PlotConfig::new()
        .with_axis(
            "x",
            AxisConfig::x()
                .with_range(0.0, 10.0)
                .with_pan(PanLimits::between(0.0, 20.0)),
        )
        .with_axis("y", AxisConfig::y().with_range(0.0, 1.0));
    let mut h = Harness::new(config);

    // Dragging left by half the plot width shows later data.
    assert!(h.plot.pan(-200.0, 0.0));
    assert_eq!(h.plot.axis("x").unwrap().domain(), (5.0, 15.0));

    assert!(h.plot.pan(-400.0, 0.0));
    assert_eq!(h.plot.axis("x").unwrap().domain(), (10.0, 20.0));

    // Already at the limit: nothing changes.
    assert!(!h.plot.pan(-100.0, 0.0));
}

#[test]
fn test_linked_axis_follows_root() {
    let config = interactive_axes().with_axis(
        "x2",
        AxisConfig::x()
            .with_position(AxisPosition::Top)
            .linked_to("x")
            .with_pan(PanLimits::unbounded()),
    );
    let mut h = Harness::new(config);
    assert_eq!(h.plot.axis("x2").unwrap().domain(), (0.0, 10.0));

    h.frame();
    h.plot.pan(40.0, 0.0);
    let root = h.plot.axis("x").unwrap().domain();
    assert_eq!(root, (-1.0, 9.0));
    assert_eq!(h.plot.axis("x2").unwrap().domain(), root);
}

#[test]
fn test_pinch_gesture_zooms_and_pans() {
    let mut h = Harness::new(interactive_axes());
    h.frame();

    h.plot.handle_gesture(GestureEvent::PinchStart {
        scale: 1.0,
        center: (200.0, 150.0),
    });
    assert!(h.plot.handle_gesture(GestureEvent::Pinch {
        scale: 2.0,
        center: (200.0, 150.0),
    }));
    assert!((h.plot.axis("x").unwrap().range() - 5.0).abs() < 1e-9);

    h.frame();
    let before = h.plot.axis("x").unwrap().domain();
    assert!(h.plot.handle_gesture(GestureEvent::PinchMove {
        center: (240.0, 150.0),
    }));
    let after = h.plot.axis("x").unwrap().domain();
    // 40px of 400px over a domain of 5.
    assert!((before.0 - after.0 - 0.5).abs() < 1e-9);
}

#[test]
fn test_labels_follow_ticks_after_pan() {
    let config = PlotConfig::new()
        .with_axis(
            "x",
            AxisConfig::x()
                .with_range(0.0, 10.0)
                .with_pan(PanLimits::unbounded())
                .with_ticks(TickConfig::new().with_count(5).with_labels())
                .with_title("Time"),
        )
        .with_axis("y", AxisConfig::y().with_range(0.0, 1.0));
    let mut h = Harness::new(config);

    let titles = h
        .plot
        .labels()
        .iter()
        .filter(|label| label.kind == LabelKind::Title)
        .count();
    assert_eq!(titles, 1);

    h.frame();
    h.plot.pan(-100.0, 0.0);
    let x = h.plot.axis("x").unwrap();
    let ticks: Vec<_> = h
        .plot
        .labels()
        .for_axis("x")
        .filter(|label| label.kind == LabelKind::Tick)
        .collect();
    assert_eq!(ticks.len(), x.ticks().len());
    assert_eq!(ticks[0].text, format_tick(x.ticks()[0].value));
    assert!(x.ticks()[0].value >= 2.5);
}
