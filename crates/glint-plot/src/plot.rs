//! The plot orchestrator: owns axes, series, materials and buffer sets and
//! drives the update/draw cycle.

use crate::{
    Axis, AxisConfig, BufferSet, DisplayContext, FrameScheduler, GestureEvent, InteractionState,
    InteractionStep, LabelLayer, Layout, Material, MaterialDescriptor, Orientation, ParameterSet,
    PlotConfig, PlotError, PlotOptions, Point, SeriesConfig, Transforms, point,
};
use bitflags::bitflags;
use glint_core::alloc::HashMap;
use glint_core::profiling::{profile_function, profile_scope};
use glint_test_utils::RasterContext;
use indexmap::IndexMap;
use std::sync::Arc;

bitflags! {
    /// Phases of [`Plot::update`]. Requested phases always run in
    /// declaration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdatePhases: u8 {
        /// Recompute dimensions and viewport from the display context.
        const DIMENSIONS = 1 << 0;
        /// Regenerate every series buffer set.
        const DATA = 1 << 1;
        /// Resolve domains, ticks and axis/grid buffer sets.
        const AXES = 1 << 2;
        /// Clear and draw everything.
        const DRAW = 1 << 3;
        /// Rebuild the label layer.
        const LABELS = 1 << 4;

        const FULL = Self::DIMENSIONS.bits()
            | Self::DATA.bits()
            | Self::AXES.bits()
            | Self::DRAW.bits()
            | Self::LABELS.bits();
        /// After the container or pixel ratio changed.
        const RESIZE = Self::DIMENSIONS.bits()
            | Self::AXES.bits()
            | Self::DRAW.bits()
            | Self::LABELS.bits();
        /// After series data changed.
        const DATA_CHANGED = Self::DATA.bits()
            | Self::AXES.bits()
            | Self::DRAW.bits()
            | Self::LABELS.bits();
        /// After pan or zoom.
        const INTERACTION = Self::AXES.bits() | Self::DRAW.bits() | Self::LABELS.bits();
    }
}

/// The entity a buffer set was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BufferOwner {
    Series(String),
    /// Axis line and tick marks.
    Axis(String),
    Grid(String),
}

type SlotKey = (BufferOwner, String);

/// An interactive 2D chart.
///
/// # Example
///
/// ```rust
/// use glint_plot::*;
/// use glint_test_utils::MockRasterContext;
/// use std::sync::Arc;
///
/// let config = PlotConfig::new()
///     .with_axis("x", AxisConfig::x().with_range(0.0, 10.0))
///     .with_axis("y", AxisConfig::y().with_range(0.0, 1.0))
///     .with_series(
///         "signal",
///         SeriesConfig::new("x", "y")
///             .with_data([(0.0, 0.0), (5.0, 1.0), (10.0, 0.0)])
///             .with_material(LINE_SOLID, ParameterSet::new().with("width", 2.0)),
///     );
///
/// let ctx = Arc::new(MockRasterContext::new());
/// let scheduler = Arc::new(ManualFrameScheduler::new());
/// let plot = Plot::new(ctx.clone(), config, DisplayContext::new(400.0, 300.0), scheduler)?;
///
/// assert_eq!(ctx.count_draws(), 1);
/// assert_eq!(plot.axis("x").unwrap().domain(), (0.0, 10.0));
/// # Ok::<(), PlotError>(())
/// ```
pub struct Plot {
    ctx: Arc<dyn RasterContext>,
    scheduler: Arc<dyn FrameScheduler>,
    display: DisplayContext,
    options: PlotOptions,
    layout: Layout,
    axes: IndexMap<String, Axis>,
    /// Linked axis to the root axis it mirrors.
    links: Vec<(String, String)>,
    series: IndexMap<String, SeriesConfig>,
    materials: IndexMap<String, Material>,
    buffers: HashMap<SlotKey, BufferSet>,
    labels: LabelLayer,
    interaction: InteractionState,
    interactive: bool,
    /// Set by `update`, cleared on the next animation frame.
    updating: bool,
}

impl Plot {
    /// Build a plot and run a full update.
    ///
    /// Fails if the context is lost or the configuration is inconsistent.
    /// Materials that fail to compile are logged and skipped.
    pub fn new(
        ctx: Arc<dyn RasterContext>,
        config: PlotConfig,
        display: DisplayContext,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Result<Self, PlotError> {
        profile_function!();

        if ctx.is_lost() {
            return Err(PlotError::ContextUnavailable(
                "rasterization context is lost".to_string(),
            ));
        }
        validate_axes(&config.axes)?;
        let links = resolve_links(&config.axes)?;
        validate_series(&config)?;

        let mut descriptors: IndexMap<String, MaterialDescriptor> = MaterialDescriptor::builtins()
            .into_iter()
            .map(|(name, descriptor)| (name.to_string(), descriptor))
            .collect();
        let interactive = config.is_interactive();
        for (name, descriptor) in config.materials {
            if descriptors.insert(name.clone(), descriptor).is_some() {
                tracing::debug!("Material '{}' replaces the built-in of the same name", name);
            }
        }
        let materials = descriptors
            .iter()
            .map(|(name, descriptor)| {
                (name.clone(), Material::new(ctx.clone(), name.clone(), descriptor))
            })
            .collect();

        let axes = config
            .axes
            .into_iter()
            .map(|(name, axis)| (name, Axis::new(axis)))
            .collect();

        let mut plot = Self {
            ctx,
            scheduler,
            display,
            options: config.options,
            layout: Layout::default(),
            axes,
            links,
            series: config.data,
            materials,
            buffers: HashMap::default(),
            labels: LabelLayer::new(),
            interaction: InteractionState::new(),
            interactive,
            updating: false,
        };

        tracing::info!(
            "Created plot with {} axes, {} series, {} materials",
            plot.axes.len(),
            plot.series.len(),
            plot.materials.len()
        );
        plot.update(UpdatePhases::FULL);
        Ok(plot)
    }

    /// Run the requested phases.
    ///
    /// While an earlier update waits for its animation frame the call is
    /// dropped (not queued) and `false` is returned.
    pub fn update(&mut self, phases: UpdatePhases) -> bool {
        profile_function!();

        if self.updating {
            tracing::debug!("Update already in flight, dropping {:?}", phases);
            return false;
        }
        self.updating = true;
        self.scheduler.request_frame();

        if phases.contains(UpdatePhases::DIMENSIONS) {
            self.update_dimensions();
        }
        if phases.contains(UpdatePhases::DATA) {
            self.update_data();
        }
        if phases.contains(UpdatePhases::AXES) {
            self.update_axes();
        }
        if phases.contains(UpdatePhases::DRAW) {
            self.draw();
        }
        if phases.contains(UpdatePhases::LABELS) {
            self.update_labels();
        }
        true
    }

    /// Frame callback from the host; lets the next update through.
    pub fn on_animation_frame(&mut self) {
        self.updating = false;
    }

    /// Whether an update ran since the last animation frame.
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    fn update_dimensions(&mut self) {
        profile_scope!("update_dimensions");

        self.layout = Layout::compute(&self.display, &self.options.margins, self.options.aspect);
        for axis in self.axes.values_mut() {
            axis.place(&self.layout);
        }
        tracing::debug!(
            "Plot area {}x{} (surface {}x{})",
            self.layout.dimensions.width,
            self.layout.dimensions.height,
            self.layout.surface.width,
            self.layout.surface.height
        );
    }

    fn update_data(&mut self) {
        profile_scope!("update_data");

        for (name, series) in &self.series {
            for (material, params) in &series.materials {
                regenerate(
                    &mut self.buffers,
                    &self.materials,
                    (BufferOwner::Series(name.clone()), material.clone()),
                    &series.data,
                    params,
                );
            }
        }
    }

    fn update_axes(&mut self) {
        profile_scope!("update_axes");

        for (name, axis) in self.axes.iter_mut() {
            if axis.is_linked() || !axis.awaits_data() {
                continue;
            }
            axis.auto_range(bound_extent(&self.series, name, axis.orientation()));
        }
        self.propagate_links();

        for (name, axis) in self.axes.iter_mut() {
            let geometry = axis.build_geometry(&self.layout);
            let config = axis.config();
            for (material, params) in &config.grid {
                regenerate(
                    &mut self.buffers,
                    &self.materials,
                    (BufferOwner::Grid(name.clone()), material.clone()),
                    &geometry.grid_lines,
                    params,
                );
            }
            for (material, params) in &config.materials {
                regenerate(
                    &mut self.buffers,
                    &self.materials,
                    (BufferOwner::Axis(name.clone()), material.clone()),
                    &geometry.axis_lines,
                    params,
                );
            }
        }
    }

    fn propagate_links(&mut self) {
        for (name, root) in &self.links {
            let Some((min, max)) = self.axes.get(root).map(Axis::domain) else {
                continue;
            };
            if let Some(axis) = self.axes.get_mut(name) {
                axis.set_domain(min, max);
            }
        }
    }

    /// Clear, then draw every series, every grid and every axis.
    fn draw(&self) {
        profile_scope!("draw");

        let ctx = self.ctx.as_ref();
        if ctx.is_lost() {
            tracing::warn!("Skipping draw: rasterization context is lost");
            return;
        }

        let surface = self.layout.surface;
        let viewport = self.layout.viewport;
        let ratio = self.layout.device_pixel_ratio as f32;

        ctx.viewport(0, 0, surface.width, surface.height);
        ctx.clear(self.options.clear_color);
        ctx.enable_alpha_blending();

        ctx.viewport(
            viewport.left,
            viewport.bottom,
            viewport.width.max(0) as u32,
            viewport.height.max(0) as u32,
        );
        for (name, series) in &self.series {
            let (Some(x), Some(y)) = (self.axes.get(&series.x_axis), self.axes.get(&series.y_axis))
            else {
                continue;
            };
            let transforms = Transforms::data(x.domain(), y.domain(), &viewport);
            for (material, params) in &series.materials {
                self.render_slot(
                    BufferOwner::Series(name.clone()),
                    material,
                    params,
                    &transforms,
                    ratio,
                );
            }
        }

        ctx.viewport(0, 0, surface.width, surface.height);
        let chart = Transforms::chart(surface);
        for (name, axis) in &self.axes {
            for (material, params) in &axis.config().grid {
                self.render_slot(BufferOwner::Grid(name.clone()), material, params, &chart, ratio);
            }
        }
        for (name, axis) in &self.axes {
            for (material, params) in &axis.config().materials {
                self.render_slot(BufferOwner::Axis(name.clone()), material, params, &chart, ratio);
            }
        }
    }

    fn render_slot(
        &self,
        owner: BufferOwner,
        material: &str,
        params: &ParameterSet,
        transforms: &Transforms,
        ratio: f32,
    ) {
        let Some(program) = self.materials.get(material) else {
            return;
        };
        let set = self.buffers.get(&(owner, material.to_string()));
        program.render(set, params, transforms, ratio);
    }

    fn update_labels(&mut self) {
        profile_scope!("update_labels");
        self.labels
            .rebuild(self.axes.iter().map(|(name, axis)| (name.as_str(), axis)));
    }

    /// Replace the display context and re-run layout, axes, draw and labels.
    pub fn resize(&mut self, display: DisplayContext) -> bool {
        self.display = display;
        self.update(UpdatePhases::RESIZE)
    }

    /// Zoom every zoomable axis by `factor` around an input-layer position.
    ///
    /// Returns whether any domain changed.
    pub fn zoom(&mut self, factor: f64, x: f64, y: f64) -> bool {
        profile_function!();

        let (px, py) = self.layout.input_to_pixel(x, y);
        let mut changed = false;
        for axis in self.axes.values_mut() {
            let pivot = match axis.orientation() {
                Orientation::X => px,
                Orientation::Y => py,
            };
            changed |= axis.zoom(factor, pivot);
        }
        if changed {
            self.propagate_links();
            self.update(UpdatePhases::INTERACTION);
        }
        changed
    }

    /// Pan every pannable axis by a pixel delta (y down).
    ///
    /// Returns whether any domain changed.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        profile_function!();

        let mut changed = false;
        for axis in self.axes.values_mut() {
            changed |= axis.pan(dx, dy, &self.layout);
        }
        if changed {
            self.propagate_links();
            self.update(UpdatePhases::INTERACTION);
        }
        changed
    }

    /// Feed one gesture event. Only wheel events are handled unless some
    /// axis accepts pan or zoom.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> bool {
        if !self.interactive && !matches!(event, GestureEvent::Wheel { .. }) {
            return false;
        }
        match self.interaction.step(event) {
            Some(InteractionStep::Zoom { factor, x, y }) => self.zoom(factor, x, y),
            Some(InteractionStep::Pan { dx, dy }) => self.pan(dx, dy),
            None => false,
        }
    }

    /// Replace the points of a series and regenerate what depends on them.
    ///
    /// Returns `false` if the series does not exist or the update was
    /// dropped; the new data is kept either way and picked up by the next
    /// update that includes [`UpdatePhases::DATA`].
    pub fn set_series_data<I, P>(&mut self, name: &str, data: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        let Some(series) = self.series.get_mut(name) else {
            tracing::warn!("Cannot set data of unknown series '{}'", name);
            return false;
        };
        series.data = point::points(data);
        self.update(UpdatePhases::DATA_CHANGED)
    }

    /// Restore the configured bounds of `axis` and auto-range the unset
    /// ones from the current data.
    ///
    /// The domain is resolved before returning, so it stays valid even when
    /// the follow-up update is dropped. Returns whether that update ran.
    pub fn reset_auto_range(&mut self, axis: &str) -> bool {
        let Some(target) = self.axes.get_mut(axis) else {
            return false;
        };
        target.reset_domain();
        if !target.is_linked() {
            target.auto_range(bound_extent(&self.series, axis, target.orientation()));
        }
        self.propagate_links();
        self.update(UpdatePhases::INTERACTION)
    }

    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.get(name)
    }

    pub fn axes(&self) -> impl Iterator<Item = (&str, &Axis)> {
        self.axes.iter().map(|(name, axis)| (name.as_str(), axis))
    }

    pub fn series(&self, name: &str) -> Option<&SeriesConfig> {
        self.series.get(name)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// The buffer set currently held for `owner` and `material`.
    pub fn buffer_set(&self, owner: BufferOwner, material: &str) -> Option<&BufferSet> {
        self.buffers.get(&(owner, material.to_string()))
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn display(&self) -> &DisplayContext {
        &self.display
    }

    pub fn labels(&self) -> &LabelLayer {
        &self.labels
    }

    /// Whether any axis accepts pan or zoom.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl Drop for Plot {
    fn drop(&mut self) {
        for ((_, material), set) in self.buffers.drain() {
            if let Some(material) = self.materials.get(&material) {
                material.clear_buffers(Some(set));
            }
        }
    }
}

impl std::fmt::Debug for Plot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plot")
            .field("axes", &self.axes.keys().collect::<Vec<_>>())
            .field("series", &self.series.keys().collect::<Vec<_>>())
            .field("materials", &self.materials.keys().collect::<Vec<_>>())
            .field("buffer_sets", &self.buffers.len())
            .field("layout", &self.layout)
            .field("updating", &self.updating)
            .finish()
    }
}

/// Combined extent of every series bound to `axis` along its orientation.
fn bound_extent(
    series: &IndexMap<String, SeriesConfig>,
    axis: &str,
    orientation: Orientation,
) -> Option<(f64, f64)> {
    series
        .values()
        .filter_map(|series| match orientation {
            Orientation::X if series.x_axis == axis => point::extent(&series.data, 0),
            Orientation::Y if series.y_axis == axis => point::extent(&series.data, 1),
            _ => None,
        })
        .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
}

/// Release the old buffer set of `key` and generate its replacement.
/// Unknown materials are skipped.
fn regenerate(
    buffers: &mut HashMap<SlotKey, BufferSet>,
    materials: &IndexMap<String, Material>,
    key: SlotKey,
    data: &[Point],
    params: &ParameterSet,
) {
    let Some(material) = materials.get(&key.1) else {
        tracing::trace!("Skipping unknown material '{}'", key.1);
        return;
    };
    material.clear_buffers(buffers.remove(&key));
    if let Some(set) = material.generate_buffers(data, params) {
        buffers.insert(key, set);
    }
}

fn validate_axes(axes: &IndexMap<String, AxisConfig>) -> Result<(), PlotError> {
    for (name, axis) in axes {
        if !axis.position.fits(axis.orientation) {
            return Err(PlotError::InvalidAxisPosition {
                axis: name.clone(),
                position: axis.position,
            });
        }
        let invalid = match (axis.min, axis.max) {
            (Some(min), Some(max)) => !(min.is_finite() && max.is_finite() && min < max),
            (Some(bound), None) | (None, Some(bound)) => !bound.is_finite(),
            (None, None) => false,
        };
        if invalid {
            return Err(PlotError::InvalidAxisRange {
                axis: name.clone(),
                min: axis.min.unwrap_or(f64::NAN),
                max: axis.max.unwrap_or(f64::NAN),
            });
        }
    }
    Ok(())
}

/// Follow every `link_axis` chain to its root.
fn resolve_links(axes: &IndexMap<String, AxisConfig>) -> Result<Vec<(String, String)>, PlotError> {
    let mut links = Vec::new();
    for (name, axis) in axes {
        let Some(mut link) = axis.link_axis.as_deref() else {
            continue;
        };
        let mut visited = vec![name.as_str()];
        loop {
            if visited.contains(&link) {
                return Err(PlotError::LinkCycle { axis: name.clone() });
            }
            let Some(target) = axes.get(link) else {
                return Err(PlotError::UnknownLinkAxis {
                    axis: name.clone(),
                    link: link.to_string(),
                });
            };
            visited.push(link);
            match target.link_axis.as_deref() {
                Some(next) => link = next,
                None => break,
            }
        }
        links.push((name.clone(), link.to_string()));
    }
    Ok(links)
}

fn validate_series(config: &PlotConfig) -> Result<(), PlotError> {
    for (name, series) in &config.data {
        for (axis_name, orientation) in [
            (&series.x_axis, Orientation::X),
            (&series.y_axis, Orientation::Y),
        ] {
            let Some(axis) = config.axes.get(axis_name) else {
                return Err(PlotError::UnknownAxis {
                    series: name.clone(),
                    axis: axis_name.clone(),
                });
            };
            if axis.orientation != orientation {
                return Err(PlotError::AxisOrientation {
                    series: name.clone(),
                    axis: axis_name.clone(),
                });
            }
        }
    }
    Ok(())
}
