//! wgpu raster backend tests.
//!
//! These need a GPU adapter - run with: cargo test -p glint-render -- --ignored

use glint_render::{GraphicsContext, WgpuRasterContext};
use glint_test_utils::{BufferData, BufferTarget, RasterContext, RasterError, ShaderStage};
use glam::{Mat4, Vec4};
use std::sync::Arc;

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const SOLID_VS: &str = include_str!("../../glint-plot/src/shaders/line_solid.vert.wgsl");
const SOLID_FS: &str = include_str!("../../glint-plot/src/shaders/line_solid.frag.wgsl");
const FILL_VS: &str = include_str!("../../glint-plot/src/shaders/fill.vert.wgsl");
const FILL_FS: &str = include_str!("../../glint-plot/src/shaders/fill.frag.wgsl");

fn raster() -> Option<WgpuRasterContext> {
    match GraphicsContext::new_owned_sync() {
        Ok(graphics) => Some(WgpuRasterContext::new(graphics, FORMAT)),
        Err(e) => {
            println!("GPU not available: {:?}", e);
            None
        }
    }
}

fn target(raster: &WgpuRasterContext, width: u32, height: u32) -> wgpu::TextureView {
    raster
        .graphics()
        .device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// Context
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_context_arc_cloning() {
    let Ok(ctx) = GraphicsContext::new_owned_sync() else {
        return;
    };
    let ctx2 = ctx.clone();
    assert_eq!(Arc::strong_count(&ctx), 2);
    assert!(ctx2.min_uniform_buffer_offset_alignment().is_power_of_two());
    drop(ctx2);
    assert_eq!(Arc::strong_count(&ctx), 1);
}

// ============================================================================
// Programs
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_plot_shaders_link() {
    let Some(raster) = raster() else { return };

    let vs = raster.compile_shader(ShaderStage::Vertex, SOLID_VS).unwrap();
    let fs = raster.compile_shader(ShaderStage::Fragment, SOLID_FS).unwrap();
    let program = raster.link_program(vs, fs).unwrap();
    raster.delete_shader(vs);
    raster.delete_shader(fs);

    assert_eq!(raster.attrib_location(program, "position").map(|l| l.raw()), Some(0));
    assert_eq!(raster.attrib_location(program, "tangent").map(|l| l.raw()), Some(1));
    assert!(raster.attrib_location(program, "linelength").is_none());

    assert_eq!(raster.uniform_location(program, "dataToPixelsMatrix").map(|l| l.raw()), Some(0));
    assert_eq!(raster.uniform_location(program, "color").map(|l| l.raw()), Some(128));
    assert!(raster.uniform_location(program, "dashes").is_none());
    assert!(!raster.is_lost());
}

#[test]
#[ignore] // Requires GPU
fn test_invalid_shader_rejected() {
    let Some(raster) = raster() else { return };

    let err = raster
        .compile_shader(ShaderStage::Vertex, "@vertex fn vs_main( -> {}")
        .unwrap_err();
    assert!(matches!(
        err,
        RasterError::ShaderCompile {
            stage: ShaderStage::Vertex,
            ..
        }
    ));
}

#[test]
#[ignore] // Requires GPU
fn test_link_with_deleted_shader() {
    let Some(raster) = raster() else { return };

    let vs = raster.compile_shader(ShaderStage::Vertex, FILL_VS).unwrap();
    let fs = raster.compile_shader(ShaderStage::Fragment, FILL_FS).unwrap();
    raster.delete_shader(fs);
    assert_eq!(
        raster.link_program(vs, fs),
        Err(RasterError::UnknownHandle("shader"))
    );
}

// ============================================================================
// Drawing
// ============================================================================

/// Upload a quad as two triangles and issue one fill draw.
fn record_fill(raster: &WgpuRasterContext) -> glint_test_utils::ProgramHandle {
    let vs = raster.compile_shader(ShaderStage::Vertex, FILL_VS).unwrap();
    let fs = raster.compile_shader(ShaderStage::Fragment, FILL_FS).unwrap();
    let program = raster.link_program(vs, fs).unwrap();

    let positions = raster.create_buffer().unwrap();
    raster.bind_buffer(BufferTarget::Array, Some(positions));
    raster.buffer_data(
        BufferTarget::Array,
        BufferData::Float32(&[-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0]),
    );
    let indices = raster.create_buffer().unwrap();
    raster.bind_buffer(BufferTarget::ElementArray, Some(indices));
    raster.buffer_data(BufferTarget::ElementArray, BufferData::Uint32(&[0, 1, 2, 0, 2, 3]));

    raster.use_program(Some(program));
    let position = raster.attrib_location(program, "position").unwrap();
    raster.bind_buffer(BufferTarget::Array, Some(positions));
    raster.vertex_attrib_pointer(position, 2);
    raster.enable_vertex_attrib_array(position);

    for name in ["dataToPixelsMatrix", "pixelsToViewportMatrix"] {
        let location = raster.uniform_location(program, name).unwrap();
        raster.uniform_matrix4fv(location, &Mat4::IDENTITY);
    }
    let color = raster.uniform_location(program, "color").unwrap();
    raster.uniform4fv(color, Vec4::new(1.0, 0.0, 0.0, 1.0));

    raster.draw_elements(6);
    raster.disable_vertex_attrib_array(position);
    program
}

#[test]
#[ignore] // Requires GPU
fn test_flush_submits_recorded_draws() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 64, 48);

    raster.viewport(0, 0, 64, 48);
    raster.clear([0.0, 0.0, 0.0, 1.0]);
    raster.enable_alpha_blending();
    record_fill(&raster);
    raster.viewport(8, 8, 16, 16);
    raster.draw_elements(6);

    // The attribute was disabled after the first draw.
    assert_eq!(raster.pending_draws(), 1);
    assert_eq!(raster.flush(&view, (64, 48)), 1);
    assert_eq!(raster.pending_draws(), 0);
    assert_eq!(raster.retained_draws(), 1);
}

#[test]
#[ignore] // Requires GPU
fn test_flush_without_new_draws_repaints_last_frame() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 64, 48);

    // Nothing drawn yet: the target is still cleared.
    assert_eq!(raster.flush(&view, (64, 48)), 0);

    raster.clear([0.0, 0.0, 0.0, 1.0]);
    record_fill(&raster);
    assert_eq!(raster.flush(&view, (64, 48)), 1);

    // An expose with no update in between.
    let fresh = target(&raster, 64, 48);
    assert_eq!(raster.flush(&fresh, (64, 48)), 1);

    // A new clear starts a new frame.
    raster.clear([1.0, 1.0, 1.0, 1.0]);
    assert_eq!(raster.flush(&fresh, (64, 48)), 0);
    assert_eq!(raster.retained_draws(), 0);
}

#[test]
#[ignore] // Requires GPU
fn test_draws_without_clear_extend_frame() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 32, 32);

    raster.clear([0.0, 0.0, 0.0, 1.0]);
    record_fill(&raster);
    assert_eq!(raster.flush(&view, (32, 32)), 1);

    record_fill(&raster);
    assert_eq!(raster.flush(&view, (32, 32)), 2);
}

#[test]
#[ignore] // Requires GPU
fn test_oversized_viewport_still_drawn() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 32, 32);

    raster.viewport(-16, -16, 64, 64);
    record_fill(&raster);
    assert_eq!(raster.flush(&view, (32, 32)), 1);
}

#[test]
#[ignore] // Requires GPU
fn test_clear_discards_earlier_draws() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 32, 32);

    record_fill(&raster);
    assert_eq!(raster.pending_draws(), 1);
    raster.clear([1.0, 1.0, 1.0, 1.0]);
    assert_eq!(raster.pending_draws(), 0);
    assert_eq!(raster.flush(&view, (32, 32)), 0);
    assert_eq!(raster.retained_draws(), 0);
}

#[test]
#[ignore] // Requires GPU
fn test_draw_survives_program_deletion() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 32, 32);

    let program = record_fill(&raster);
    raster.delete_program(program);
    assert!(raster.program_layout(program).is_none());
    assert_eq!(raster.flush(&view, (32, 32)), 1);
}

#[test]
#[ignore] // Requires GPU
fn test_offscreen_viewport_skipped() {
    let Some(raster) = raster() else { return };
    let view = target(&raster, 32, 32);

    raster.viewport(100, 100, 10, 10);
    record_fill(&raster);
    assert_eq!(raster.pending_draws(), 1);
    assert_eq!(raster.flush(&view, (32, 32)), 0);
}
