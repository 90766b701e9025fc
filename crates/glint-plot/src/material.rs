//! Materials: a compiled program, its attribute layout and parameter schema.

use crate::{
    DashedStroke, FilledArea, ParameterSet, ParameterValue, Point, SolidStroke, SurfaceSize,
    Tessellator, Viewport,
};
use glam::{DMat4, DVec3, Mat4};
use glint_test_utils::{
    AttribLocation, BufferData, BufferHandle, BufferTarget, ProgramHandle, RasterContext,
    RasterError, ShaderStage, UniformLocation,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Name of the built-in area material.
pub const FILL: &str = "fill";
/// Name of the built-in solid line material.
pub const LINE_SOLID: &str = "lineSolid";
/// Name of the built-in dashed line material.
pub const LINE_DASHED: &str = "lineDashed";

/// Uniform receiving the data-to-pixel transform.
pub const DATA_TO_PIXELS: &str = "dataToPixelsMatrix";
/// Uniform receiving the pixel-to-clip transform.
pub const PIXELS_TO_VIEWPORT: &str = "pixelsToViewportMatrix";

/// Parameter scaled by the device pixel ratio on upload.
const WIDTH: &str = "width";

const DEFAULT_COLOR: [f32; 4] = [0.0, 0.25, 0.75, 0.5];

/// Everything needed to build a [`Material`].
#[derive(Debug, Clone)]
pub struct MaterialDescriptor {
    pub vertex_source: Cow<'static, str>,
    pub fragment_source: Cow<'static, str>,
    pub tessellator: Arc<dyn Tessellator>,
    /// Parameter schema; the shape of each default fixes how it is uploaded.
    pub defaults: ParameterSet,
}

impl MaterialDescriptor {
    pub fn new(
        vertex_source: impl Into<Cow<'static, str>>,
        fragment_source: impl Into<Cow<'static, str>>,
        tessellator: impl Tessellator + 'static,
        defaults: ParameterSet,
    ) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            tessellator: Arc::new(tessellator),
            defaults,
        }
    }

    /// Area between a series and a baseline.
    pub fn fill() -> Self {
        Self::new(
            include_str!("shaders/fill.vert.wgsl"),
            include_str!("shaders/fill.frag.wgsl"),
            FilledArea,
            ParameterSet::new()
                .with("color", DEFAULT_COLOR)
                .with("baseline", 0.0f32),
        )
    }

    /// Solid polyline.
    pub fn line_solid() -> Self {
        Self::new(
            include_str!("shaders/line_solid.vert.wgsl"),
            include_str!("shaders/line_solid.frag.wgsl"),
            SolidStroke,
            ParameterSet::new()
                .with("color", DEFAULT_COLOR)
                .with(WIDTH, 1.0f32),
        )
    }

    /// Dashed polyline. `dashes` holds the period in pixels and the drawn
    /// fraction of each period.
    pub fn line_dashed() -> Self {
        Self::new(
            include_str!("shaders/line_dashed.vert.wgsl"),
            include_str!("shaders/line_dashed.frag.wgsl"),
            DashedStroke,
            ParameterSet::new()
                .with("color", DEFAULT_COLOR)
                .with(WIDTH, 1.0f32)
                .with("dashes", [8.0f32, 0.5]),
        )
    }

    /// The built-in materials by name.
    pub fn builtins() -> [(&'static str, MaterialDescriptor); 3] {
        [
            (FILL, Self::fill()),
            (LINE_SOLID, Self::line_solid()),
            (LINE_DASHED, Self::line_dashed()),
        ]
    }
}

/// The two transforms every material draw is issued with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transforms {
    pub data_to_pixels: Mat4,
    pub pixels_to_viewport: Mat4,
}

impl Transforms {
    /// Series pass: the data domain `x` by `y` onto the plot-area viewport.
    ///
    /// `data_to_pixels` lands in viewport-local device pixels, which
    /// `pixels_to_viewport` maps to clip space.
    pub fn data(x: (f64, f64), y: (f64, f64), viewport: &Viewport) -> Self {
        let (w, h) = (viewport.width as f64, viewport.height as f64);
        let ortho = DMat4::orthographic_rh_gl(x.0, x.1, y.0, y.1, -1.0, 1.0);
        let norm_to_pixels = DMat4::from_translation(DVec3::new(0.5 * w, 0.5 * h, 0.0))
            * DMat4::from_scale(DVec3::new(0.5 * w, 0.5 * h, 1.0));

        Self {
            data_to_pixels: (norm_to_pixels * ortho).as_mat4(),
            pixels_to_viewport: Mat4::orthographic_rh_gl(0.0, w as f32, 0.0, h as f32, -1.0, 1.0),
        }
    }

    /// Axis and grid pass: geometry is already in surface pixels.
    pub fn chart(surface: SurfaceSize) -> Self {
        Self {
            data_to_pixels: Mat4::IDENTITY,
            pixels_to_viewport: Mat4::orthographic_rh_gl(
                0.0,
                surface.width as f32,
                0.0,
                surface.height as f32,
                -1.0,
                1.0,
            ),
        }
    }
}

impl Default for Transforms {
    fn default() -> Self {
        Self {
            data_to_pixels: Mat4::IDENTITY,
            pixels_to_viewport: Mat4::IDENTITY,
        }
    }
}

/// GPU buffers generated for one (entity, material) pair.
///
/// Owns its buffers exclusively; give it back to
/// [`Material::clear_buffers`] to release them.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferSet {
    attributes: Vec<(&'static str, BufferHandle)>,
    indices: BufferHandle,
    index_count: u32,
}

impl BufferSet {
    pub fn attribute(&self, name: &str) -> Option<BufferHandle> {
        self.attributes
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, buffer)| *buffer)
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    fn handles(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.attributes
            .iter()
            .map(|(_, buffer)| *buffer)
            .chain(std::iter::once(self.indices))
    }
}

#[derive(Debug)]
struct Program {
    handle: ProgramHandle,
    attributes: Vec<(&'static str, Option<AttribLocation>)>,
    /// Location per schema parameter, in schema order.
    parameters: Vec<Option<UniformLocation>>,
    data_to_pixels: Option<UniformLocation>,
    pixels_to_viewport: Option<UniformLocation>,
}

/// A compiled program bound to a tessellator and a parameter schema.
///
/// Construction never fails the caller: if compiling or linking fails the
/// error is logged and the material stays invalid, turning
/// [`generate_buffers`](Self::generate_buffers) and [`render`](Self::render)
/// into no-ops.
pub struct Material {
    ctx: Arc<dyn RasterContext>,
    name: String,
    tessellator: Arc<dyn Tessellator>,
    defaults: ParameterSet,
    program: Option<Program>,
}

impl Material {
    pub fn new(
        ctx: Arc<dyn RasterContext>,
        name: impl Into<String>,
        descriptor: &MaterialDescriptor,
    ) -> Self {
        let name = name.into();
        let program = match Self::build_program(ctx.as_ref(), descriptor) {
            Ok(program) => Some(program),
            Err(err) => {
                tracing::error!("Material '{}' is unusable: {}", name, err);
                None
            }
        };

        Self {
            ctx,
            name,
            tessellator: descriptor.tessellator.clone(),
            defaults: descriptor.defaults.clone(),
            program,
        }
    }

    fn build_program(
        ctx: &dyn RasterContext,
        descriptor: &MaterialDescriptor,
    ) -> Result<Program, RasterError> {
        let vertex = ctx.compile_shader(ShaderStage::Vertex, &descriptor.vertex_source)?;
        let fragment = match ctx.compile_shader(ShaderStage::Fragment, &descriptor.fragment_source)
        {
            Ok(fragment) => fragment,
            Err(err) => {
                ctx.delete_shader(vertex);
                return Err(err);
            }
        };
        let linked = ctx.link_program(vertex, fragment);
        ctx.delete_shader(vertex);
        ctx.delete_shader(fragment);
        let handle = linked?;

        let attributes = descriptor
            .tessellator
            .attributes()
            .iter()
            .map(|name| (*name, ctx.attrib_location(handle, name)))
            .collect();
        let parameters = descriptor
            .defaults
            .iter()
            .map(|(name, _)| ctx.uniform_location(handle, name))
            .collect();

        Ok(Program {
            handle,
            attributes,
            parameters,
            data_to_pixels: ctx.uniform_location(handle, DATA_TO_PIXELS),
            pixels_to_viewport: ctx.uniform_location(handle, PIXELS_TO_VIEWPORT),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the program compiled and linked.
    pub fn is_valid(&self) -> bool {
        self.program.is_some()
    }

    pub fn defaults(&self) -> &ParameterSet {
        &self.defaults
    }

    /// Tessellate `data` and upload the result as static buffers.
    ///
    /// Returns `None` for an invalid material, for data that produces no
    /// triangles, or when the context refuses to allocate.
    pub fn generate_buffers(&self, data: &[Point], parameters: &ParameterSet) -> Option<BufferSet> {
        self.program.as_ref()?;
        let style = self.defaults.resolve(parameters);
        let mesh = self.tessellator.tessellate(data, &style);
        if mesh.is_empty() {
            return None;
        }

        let mut created = Vec::new();
        let result = (|| -> Result<BufferSet, RasterError> {
            let mut attributes = Vec::new();
            for (name, values) in mesh.attributes() {
                let buffer = self.ctx.create_buffer()?;
                created.push(buffer);
                self.ctx.bind_buffer(BufferTarget::Array, Some(buffer));
                self.ctx
                    .buffer_data(BufferTarget::Array, BufferData::Float32(values));
                attributes.push((name, buffer));
            }

            let indices = self.ctx.create_buffer()?;
            created.push(indices);
            self.ctx
                .bind_buffer(BufferTarget::ElementArray, Some(indices));
            self.ctx
                .buffer_data(BufferTarget::ElementArray, BufferData::Uint32(mesh.indices()));

            Ok(BufferSet {
                attributes,
                indices,
                index_count: mesh.index_count() as u32,
            })
        })();

        match result {
            Ok(set) => {
                tracing::trace!(
                    "Material '{}' uploaded {} vertices, {} indices",
                    self.name,
                    mesh.vertex_count(),
                    set.index_count
                );
                Some(set)
            }
            Err(err) => {
                tracing::warn!("Material '{}' could not upload buffers: {}", self.name, err);
                for buffer in created {
                    self.ctx.delete_buffer(buffer);
                }
                None
            }
        }
    }

    /// Release every buffer of `set`. `None` is a no-op.
    pub fn clear_buffers(&self, set: Option<BufferSet>) {
        let Some(set) = set else {
            return;
        };
        for buffer in set.handles() {
            self.ctx.delete_buffer(buffer);
        }
    }

    /// Draw `set` with `parameters` under `transforms`.
    ///
    /// A `width` scalar is multiplied by `device_pixel_ratio`; everything
    /// else is uploaded as given. `None` (buffers not generated yet) and
    /// invalid materials draw nothing.
    pub fn render(
        &self,
        set: Option<&BufferSet>,
        parameters: &ParameterSet,
        transforms: &Transforms,
        device_pixel_ratio: f32,
    ) {
        let (Some(set), Some(program)) = (set, self.program.as_ref()) else {
            return;
        };
        if self.ctx.is_lost() {
            return;
        }
        let ctx = self.ctx.as_ref();

        ctx.use_program(Some(program.handle));

        let mut enabled = Vec::with_capacity(program.attributes.len());
        for (name, location) in &program.attributes {
            let (Some(location), Some(buffer)) = (location, set.attribute(name)) else {
                continue;
            };
            ctx.bind_buffer(BufferTarget::Array, Some(buffer));
            ctx.vertex_attrib_pointer(*location, 2);
            ctx.enable_vertex_attrib_array(*location);
            enabled.push(*location);
        }

        let style = self.defaults.resolve(parameters);
        for ((name, value), location) in style.iter().zip(&program.parameters) {
            let Some(location) = *location else {
                continue;
            };
            match *value {
                ParameterValue::Scalar(v) if name == WIDTH => {
                    ctx.uniform1f(location, v * device_pixel_ratio)
                }
                ParameterValue::Scalar(v) => ctx.uniform1f(location, v),
                ParameterValue::Vec2(v) => ctx.uniform2fv(location, v),
                ParameterValue::Vec3(v) => ctx.uniform3fv(location, v),
                ParameterValue::Vec4(v) => ctx.uniform4fv(location, v),
                ParameterValue::Mat4(ref m) => ctx.uniform_matrix4fv(location, m),
            }
        }

        if let Some(location) = program.data_to_pixels {
            ctx.uniform_matrix4fv(location, &transforms.data_to_pixels);
        }
        if let Some(location) = program.pixels_to_viewport {
            ctx.uniform_matrix4fv(location, &transforms.pixels_to_viewport);
        }

        ctx.bind_buffer(BufferTarget::ElementArray, Some(set.indices));
        ctx.draw_elements(set.index_count);

        for location in enabled {
            ctx.disable_vertex_attrib_array(location);
        }
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.ctx.delete_program(program.handle);
        }
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("valid", &self.is_valid())
            .field("tessellator", &self.tessellator)
            .finish()
    }
}
