//! The rasterization context every Glint renderer draws through.
//!
//! The surface is deliberately small and stateful in the classic immediate
//! style: a current program, a buffer bound per [`BufferTarget`], attribute
//! arrays enabled by location. Plot code only ever talks to this trait, so it
//! can run against the wgpu backend or against `MockRasterContext` in tests.

use crate::raster_types::*;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Trait abstracting the fixed set of rasterization operations.
///
/// # Borrow Checking Pattern
///
/// Methods take `&self` so a single context can be shared (via `Arc`) by all
/// materials of a plot. Implementations keep their mutable state behind a
/// lock.
///
/// # Example
///
/// ```rust,no_run
/// use glint_test_utils::{BufferData, BufferTarget, RasterContext};
///
/// fn upload_triangle(ctx: &dyn RasterContext) {
///     let Ok(buffer) = ctx.create_buffer() else { return };
///     ctx.bind_buffer(BufferTarget::Array, Some(buffer));
///     ctx.buffer_data(
///         BufferTarget::Array,
///         BufferData::Float32(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
///     );
///     ctx.delete_buffer(buffer);
/// }
/// ```
pub trait RasterContext: Send + Sync {
    /// Whether the underlying device has been lost.
    fn is_lost(&self) -> bool {
        false
    }

    // Programs

    /// Compile one shader stage.
    fn compile_shader(&self, stage: ShaderStage, source: &str)
    -> Result<ShaderHandle, RasterError>;

    fn delete_shader(&self, shader: ShaderHandle);

    /// Link a vertex and a fragment stage.
    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, RasterError>;

    fn delete_program(&self, program: ProgramHandle);

    /// Make `program` current for uniform uploads and draws.
    fn use_program(&self, program: Option<ProgramHandle>);

    /// Location of a vertex input, `None` if the program has no such input.
    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<AttribLocation>;

    /// Location of a uniform, `None` if the program has no such uniform.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    // Buffers

    fn create_buffer(&self) -> Result<BufferHandle, RasterError>;

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Replace the contents of the buffer bound at `target` (static usage).
    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>);

    fn delete_buffer(&self, buffer: BufferHandle);

    // Uniforms, applied to the current program

    fn uniform1f(&self, location: UniformLocation, value: f32);

    fn uniform2fv(&self, location: UniformLocation, value: Vec2);

    fn uniform3fv(&self, location: UniformLocation, value: Vec3);

    fn uniform4fv(&self, location: UniformLocation, value: Vec4);

    fn uniform_matrix4fv(&self, location: UniformLocation, value: &Mat4);

    // Attributes

    /// Source `location` from the buffer currently bound at
    /// [`BufferTarget::Array`] as tightly packed f32 vectors.
    fn vertex_attrib_pointer(&self, location: AttribLocation, components: u32);

    fn enable_vertex_attrib_array(&self, location: AttribLocation);

    fn disable_vertex_attrib_array(&self, location: AttribLocation);

    // Drawing

    /// Draw `count` u32 indices from the bound element buffer as a triangle list.
    fn draw_elements(&self, count: u32);

    /// Set the viewport in device pixels, origin at the bottom-left corner.
    fn viewport(&self, x: i32, y: i32, width: u32, height: u32);

    /// Clear the whole surface to `color`.
    fn clear(&self, color: [f32; 4]);

    /// Blend with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` for subsequent draws.
    fn enable_alpha_blending(&self);
}
